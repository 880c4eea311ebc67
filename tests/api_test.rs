use dotpath::csv::CsvOptions;
use dotpath::value::Value;
use dotpath::Tree;
use std::io::Write;

#[test]
fn test_tree_from_json_and_queries() {
    let tree = Tree::from_json(r#"{ "a": { "b": [10.0, 20.0] } }"#).unwrap();
    assert_eq!(tree.get("a.b.1").unwrap(), Some(Value::Number(20.0)));
    assert_eq!(tree.get("a.missing").unwrap(), None);
}

#[test]
fn test_tree_edits_are_visible() {
    let mut tree = Tree::from_json(r#"{ "counts": [1.0] }"#).unwrap();
    tree.set("counts.1", &Value::Number(2.0)).unwrap();
    tree.add("label", &Value::from("totals")).unwrap();
    assert_eq!(
        tree.to_json().unwrap(),
        r#"{"counts":[1.0,2.0],"label":"totals"}"#
    );
    tree.remove("counts").unwrap();
    assert_eq!(tree.to_json().unwrap(), r#"{"label":"totals"}"#);
}

#[test]
fn test_tree_from_xml_query() {
    let tree = Tree::from_xml(
        "<config><server><host>a</host></server><server><host>b</host></server></config>",
    )
    .unwrap();
    assert_eq!(
        tree.get("server.1.host").unwrap(),
        Some(Value::String("b".to_string()))
    );
}

#[test]
fn test_tree_from_csv_query() {
    let tree = Tree::from_csv("name,role\nalice,admin\n", &CsvOptions::default()).unwrap();
    assert_eq!(
        tree.get("0.role").unwrap(),
        Some(Value::String("admin".to_string()))
    );
}

#[test]
fn test_load_dispatches_by_extension() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    write!(file, r#"{{ "loaded": true }}"#).unwrap();

    let tree = Tree::load(file.path()).unwrap();
    assert_eq!(tree.get("loaded").unwrap(), Some(Value::Boolean(true)));
}

#[test]
fn test_serialize_delegates_to_root() {
    let tree = Tree::from_json(r#"{ "a": 1.0 }"#).unwrap();
    assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"a":1.0}"#);
    assert_eq!(tree.to_yaml().unwrap(), "a: 1.0\n");
}

#[test]
fn test_flatten_exposed_on_tree() {
    let tree = Tree::from_json(r#"{ "a": { "b": true } }"#).unwrap();
    let flat = tree.flatten();
    assert_eq!(flat.get("a.b"), Some(&Value::Boolean(true)));
}
