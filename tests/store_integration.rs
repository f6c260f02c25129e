use flatdoc::catalog::{EDGE, GQUERY, NODE};
use flatdoc::model::Value;
use flatdoc::{FlatdocError, Key, PathResolver, Store};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

fn put(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

#[test]
fn second_instance_with_the_same_key_is_a_duplicate() {
    let dir = TempDir::new().unwrap();
    let store = Store::new(PathResolver::single(dir.path()));
    let nodes = store.manager(&NODE);

    let first = nodes.new_document("a", None).unwrap();
    nodes.write(&first).unwrap();

    let second = nodes.new_document("a", None).unwrap();
    second.borrow_mut().set("sector", "other").unwrap();
    assert!(matches!(
        nodes.write(&second),
        Err(FlatdocError::DuplicateKey { .. })
    ));
    assert_eq!(read(dir.path(), "nodes/a.ad"), "- has_loss = false\n");
    assert!(Rc::ptr_eq(&nodes.fetch("a").unwrap(), &first));
}

#[test]
fn renamed_document_answers_to_the_new_key_only() {
    let dir = TempDir::new().unwrap();
    put(dir.path(), "nodes/foo.ad", "- sector = energy\n");
    let store = Store::new(PathResolver::single(dir.path()));
    let nodes = store.manager(&NODE);

    let doc = nodes.fetch("foo").unwrap();
    doc.borrow_mut().set_key(Key::new("foo2").unwrap());
    nodes.save(&doc).unwrap();

    assert!(matches!(
        nodes.fetch("foo"),
        Err(FlatdocError::DocumentNotFound { .. })
    ));
    assert!(nodes.get("foo").unwrap().is_none());
    assert!(Rc::ptr_eq(&nodes.fetch("foo2").unwrap(), &doc));
    assert!(!dir.path().join("nodes/foo.ad").exists());
    assert_eq!(read(dir.path(), "nodes/foo2.ad"), "- sector = energy\n- has_loss = false\n");
}

#[test]
fn documents_round_trip_through_the_store() {
    let dir = TempDir::new().unwrap();
    let text = "\
# Coal fired power plant.
# Numbers from the survey.

- sector = energy
- groups = [ power, coal ]
- input.coal = 1.0
- output.electricity = 0.38
- output.loss = 0.62
- has_loss = true
- full_load_hours = 8000.0

~ demand =
  SUM(
    V(a, demand),
    V(b, demand)
  )
";
    put(dir.path(), "nodes/plants/coal_plant.converter.ad", text);
    let store = Store::new(PathResolver::single(dir.path()));
    let nodes = store.manager(&NODE);

    let doc = nodes.fetch("coal_plant").unwrap();
    {
        let d = doc.borrow();
        assert_eq!(d.comments(), Some("Coal fired power plant.\nNumbers from the survey."));
        assert_eq!(
            d.get("groups"),
            Some(&Value::List(vec!["power".into(), "coal".into()]))
        );
        let output = d.get("output").and_then(Value::as_map).unwrap();
        assert_eq!(output.get("electricity"), Some(&Value::Float(0.38)));
        assert_eq!(d.query("demand"), Some("SUM(\n  V(a, demand),\n  V(b, demand)\n)"));
    }

    nodes.write(&doc).unwrap();
    assert_eq!(read(dir.path(), "nodes/plants/coal_plant.converter.ad"), text);
}

#[test]
fn clear_rereads_out_of_band_edits() {
    let dir = TempDir::new().unwrap();
    put(dir.path(), "gqueries/total.gql", "- unit = PJ\n\n~ query =\n  SUM(1, 2)\n");
    let store = Store::new(PathResolver::single(dir.path()));
    let gqueries = store.manager(&GQUERY);

    let before = gqueries.fetch("total").unwrap();
    put(dir.path(), "gqueries/total.gql", "- unit = MJ\n");
    put(dir.path(), "gqueries/extra.gql", "");
    assert!(!gqueries.contains_key("extra").unwrap());
    assert!(Rc::ptr_eq(&before, &gqueries.fetch("total").unwrap()));

    store.clear();
    let after = gqueries.fetch("total").unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
    assert_eq!(after.borrow().get("unit"), Some(&Value::from("MJ")));
    assert!(after.borrow().queries().is_empty());
    assert!(gqueries.contains_key("extra").unwrap());
}

#[test]
fn all_stays_consistent_around_writes() {
    let dir = TempDir::new().unwrap();
    put(dir.path(), "edges/a.ad", "");
    let store = Store::new(PathResolver::single(dir.path()));
    let edges = store.manager(&EDGE);

    let b = edges.new_document("b", Some("flexible")).unwrap();
    edges.write(&b).unwrap();

    let all = edges.all().unwrap();
    assert_eq!(all.len(), 2);
    assert!(Rc::ptr_eq(&all[1], &b));

    let c = edges.new_document("c", None).unwrap();
    edges.write(&c).unwrap();
    let keys: Vec<String> = edges
        .all()
        .unwrap()
        .iter()
        .map(|d| d.borrow().key().to_string())
        .collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
}

mod overlay {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixture {
        _dir: TempDir,
        preferred: std::path::PathBuf,
        fallback: std::path::PathBuf,
        store: Store,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let preferred = dir.path().join("derived");
        let fallback = dir.path().join("base");
        put(&fallback, "nodes/coal.ad", "- sector = base\n");
        put(&fallback, "nodes/gas.ad", "- sector = base\n");
        put(&preferred, "nodes/coal.ad", "- sector = derived\n");
        let store = Store::new(PathResolver::overlay(&preferred, &fallback));
        Fixture {
            _dir: dir,
            preferred,
            fallback,
            store,
        }
    }

    #[test]
    fn preferred_copies_win() {
        let fx = fixture();
        let nodes = fx.store.manager(&NODE);
        let coal = nodes.fetch("coal").unwrap();
        assert_eq!(coal.borrow().get("sector"), Some(&Value::from("derived")));
        let gas = nodes.fetch("gas").unwrap();
        assert_eq!(gas.borrow().get("sector"), Some(&Value::from("base")));
        assert_eq!(nodes.keys().unwrap().len(), 2);
    }

    #[test]
    fn new_documents_go_to_the_preferred_side() {
        let fx = fixture();
        let nodes = fx.store.manager(&NODE);
        let wind = nodes.new_document("wind", None).unwrap();
        nodes.write(&wind).unwrap();
        assert!(fx.preferred.join("nodes/wind.ad").is_file());
        assert!(!fx.fallback.join("nodes/wind.ad").exists());
    }

    #[test]
    fn deleting_an_override_reveals_the_base_copy() {
        let fx = fixture();
        let nodes = fx.store.manager(&NODE);
        let coal = nodes.fetch("coal").unwrap();
        nodes.delete(&coal).unwrap();

        assert!(!fx.preferred.join("nodes/coal.ad").exists());
        let base = nodes.fetch("coal").unwrap();
        assert!(!Rc::ptr_eq(&coal, &base));
        assert_eq!(base.borrow().get("sector"), Some(&Value::from("base")));
        assert_eq!(nodes.all().unwrap().len(), 2);
    }

    #[test]
    fn scoped_root_is_restored_after_an_error() {
        let fx = fixture();
        let nodes = fx.store.manager(&NODE);
        assert_eq!(nodes.keys().unwrap().len(), 2);

        let result: flatdoc::Result<()> =
            fx.store.with_root(PathResolver::single(&fx.preferred), |store| {
                assert_eq!(store.manager(&NODE).keys()?.len(), 1);
                store.manager(&NODE).fetch("gas")?;
                Ok(())
            });
        assert!(matches!(result, Err(FlatdocError::DocumentNotFound { .. })));
        assert_eq!(
            fx.store.root(),
            PathResolver::overlay(&fx.preferred, &fx.fallback)
        );
        assert_eq!(nodes.keys().unwrap().len(), 2);
    }
}
