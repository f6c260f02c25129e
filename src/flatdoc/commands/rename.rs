use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::Key;
use crate::schema::DocumentType;
use crate::store::Store;

pub fn run(
    store: &Store,
    doc_type: &'static DocumentType,
    old: &str,
    new: &str,
) -> Result<CmdResult> {
    let new_key = Key::new(new)?;
    let manager = store.manager(doc_type);
    let doc = manager.fetch(old)?;
    let old_key = doc.borrow().key().clone();

    doc.borrow_mut().set_key(new_key);
    if let Err(err) = manager.save(&doc) {
        // The cached instance must keep answering to its old key.
        doc.borrow_mut().set_key(old_key);
        return Err(err);
    }

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Renamed {} {} to {}",
        doc_type.name, old, new
    )));
    Ok(result.with_documents(vec![doc]))
}
