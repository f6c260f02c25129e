use crate::commands::CmdResult;
use crate::error::Result;
use crate::schema::DocumentType;
use crate::store::Store;

pub fn run(store: &Store, doc_type: &'static DocumentType, key: &str) -> Result<CmdResult> {
    let doc = store.manager(doc_type).fetch(key)?;
    Ok(CmdResult::default().with_documents(vec![doc]))
}
