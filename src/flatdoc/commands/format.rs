use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::schema::DocumentType;
use crate::store::Store;
use std::fs;

/// Rewrites documents whose file differs from their canonical form. With
/// `key`, only that document.
pub fn run(store: &Store, doc_type: &'static DocumentType, key: Option<&str>) -> Result<CmdResult> {
    let manager = store.manager(doc_type);
    let docs = match key {
        Some(key) => vec![manager.fetch(key)?],
        None => manager.all()?,
    };

    let mut result = CmdResult::default();
    let mut unchanged = 0;
    for doc in &docs {
        let (canonical, current) = {
            let d = doc.borrow();
            let current = match d.path() {
                Some(path) => fs::read_to_string(path)?,
                None => String::new(),
            };
            (d.to_text()?, current)
        };
        if canonical == current {
            unchanged += 1;
            continue;
        }
        manager.write(doc)?;
        result.add_message(CmdMessage::success(format!(
            "Formatted {}",
            doc.borrow().key()
        )));
    }

    result.add_message(CmdMessage::info(format!(
        "{} of {} already canonical.",
        unchanged,
        docs.len()
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NODE;
    use crate::commands::test_utils::store_with;

    #[test]
    fn rewrites_only_non_canonical_files() {
        let (dir, store) = store_with(&[
            ("nodes/messy.ad", "- demand   =  5\n- sector=energy\n"),
            ("nodes/tidy.ad", "- has_loss = false\n"),
        ]);
        let result = run(&store, &NODE, None).unwrap();

        let formatted: Vec<_> = result
            .messages
            .iter()
            .filter(|m| m.content.starts_with("Formatted"))
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(formatted, vec!["Formatted messy"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("nodes/messy.ad")).unwrap(),
            "- sector = energy\n- demand = 5.0\n- has_loss = false\n"
        );
    }

    #[test]
    fn single_key() {
        let (dir, store) = store_with(&[("nodes/a.ad", "- sector=x\n"), ("nodes/b.ad", "- sector=y\n")]);
        run(&store, &NODE, Some("a")).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("nodes/b.ad")).unwrap(),
            "- sector=y\n"
        );
    }
}
