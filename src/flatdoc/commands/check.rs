use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::schema::DocumentType;
use crate::store::Store;

/// Loads every document of every type in `types` and reports each failure,
/// instead of stopping at the first one.
pub fn run(store: &Store, types: &[&'static DocumentType]) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let mut loaded = 0;
    let mut failed = 0;

    for &doc_type in types {
        let manager = store.manager(doc_type);
        let keys = match manager.keys() {
            Ok(keys) => keys,
            Err(err) => {
                failed += 1;
                result.add_message(CmdMessage::error(format!("{}: {}", doc_type.name, err)));
                continue;
            }
        };
        for key in keys {
            match manager.get(key.as_str()) {
                Ok(_) => loaded += 1,
                Err(err) => {
                    failed += 1;
                    result.add_message(CmdMessage::error(format!("{}: {}", doc_type.name, err)));
                }
            }
        }
    }

    if failed == 0 {
        result.add_message(CmdMessage::success(format!(
            "{} documents loaded, no problems found.",
            loaded
        )));
    } else {
        result.add_message(CmdMessage::warning(format!(
            "{} documents loaded, {} problem(s).",
            loaded, failed
        )));
    }
    Ok(result)
}
