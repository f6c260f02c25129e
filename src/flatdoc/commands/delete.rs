use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::schema::DocumentType;
use crate::store::Store;

pub fn run(store: &Store, doc_type: &'static DocumentType, key: &str) -> Result<CmdResult> {
    let manager = store.manager(doc_type);
    let doc = manager.fetch(key)?;
    let path = doc.borrow().path().map(|p| p.to_path_buf());
    manager.delete(&doc)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Deleted {} {}",
        doc_type.name, key
    )));
    if manager.contains_key(key)? {
        // Overlay: a fallback copy is visible again.
        result.add_message(CmdMessage::warning(format!(
            "{} is still provided by the fallback directory",
            key
        )));
    } else if let Some(path) = path {
        result.add_message(CmdMessage::info(path.display().to_string()));
    }
    Ok(result)
}
