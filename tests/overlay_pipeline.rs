use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tempfile::tempdir;
use white_label_overlay::{OverlayBuilder, OverlayConfig, SlotId};

fn write(path: &Path, contents: &str) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, contents).unwrap();
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
  pairs
    .iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

#[test]
fn branded_build_stages_and_transforms_overrides() {
  let temp = tempdir().unwrap();
  let root = temp.path();

  write(&root.join("defaults/index.html"), "<div id=\"main\"></div>");
  write(&root.join("defaults/theme.css"), "body {}");
  write(&root.join("defaults/config.yaml"), "brand: default");
  write(&root.join("defaults/queries.graphql"), "query { me { id } }");
  write(&root.join("defaults/config.js"), "export default {};");

  write(
    &root.join("brands/acme/shell.html"),
    "<html><!-- acme shell --><body><div id=\"main\"></div><!-- <!-- old --> --></body></html>",
  );
  write(&root.join("brands/acme/acme.css"), "body { color: orange; }");
  write(
    &root.join("brands/acme/config.js"),
    "export const Logo = () => <img src=\"/acme.svg\" />;\n",
  );

  let builder = OverlayBuilder::new(OverlayConfig::default(), root);
  let staged = builder
    .stage(&env(&[
      ("OVERLAY_HTML_PATH", "brands/acme/shell.html"),
      ("OVERLAY_CSS_PATH", "brands/acme/acme.css"),
      ("OVERLAY_CONFIG_JS_PATH", "brands/acme/config.js"),
    ]))
    .unwrap();

  let stage = root.join("src/overrides");
  assert_eq!(
    fs::read_to_string(stage.join("override.css")).unwrap(),
    "body { color: orange; }"
  );
  assert_eq!(
    staged.resolved(SlotId::Graphql).unwrap().destination,
    stage.join("queries.graphql")
  );

  let hooks = builder.transforms();

  let entry = staged.html_entry().unwrap();
  assert_eq!(entry, root.join("brands/acme/shell.html"));
  let html = hooks
    .transform_document(&fs::read_to_string(entry).unwrap())
    .unwrap();
  assert_eq!(
    html,
    "<html><body><div id=\"main\"></div><script type=\"module\" src=\"/src/main.jsx\"></script> </body></html>"
  );

  let config_path = stage.join("config.js");
  let config_code = fs::read_to_string(&config_path).unwrap();
  let transformed = hooks
    .transform_file(&config_code, &config_path)
    .unwrap()
    .unwrap();
  assert!(transformed.contains("react/jsx-runtime"), "{transformed}");

  let yaml_path = stage.join("config.yaml");
  let yaml = hooks
    .transform_file(&fs::read_to_string(&yaml_path).unwrap(), &yaml_path)
    .unwrap();
  assert_eq!(yaml.as_deref(), Some("export default {\"brand\":\"default\"};\n"));

  let outside = root.join("vendor/widget.js");
  assert_eq!(hooks.transform_file("let a = 1;", &outside).unwrap(), None);
}
