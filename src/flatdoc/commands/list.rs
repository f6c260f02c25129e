use crate::commands::{CmdMessage, CmdResult, DocumentSummary};
use crate::error::Result;
use crate::schema::DocumentType;
use crate::store::Store;

pub fn run(store: &Store, doc_type: &'static DocumentType) -> Result<CmdResult> {
    let docs = store.manager(doc_type).all()?;
    let listed: Vec<_> = docs.iter().map(DocumentSummary::of).collect();

    let mut result = CmdResult::default();
    if listed.is_empty() {
        result.add_message(CmdMessage::info(format!(
            "No {} documents found.",
            doc_type.name
        )));
    }
    Ok(result.with_listed(listed))
}
