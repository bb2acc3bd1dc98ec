//! Resolution scenarios against a real filesystem.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use sassbridge::{DualResolver, ImporterAdapter, ResolveOptions};

fn write(root: &Utf8Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn tmp_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

fn file_backed(general: ResolveOptions) -> DualResolver {
    DualResolver::from_options(ResolveOptions::sass_style(), general)
}

#[tokio::test]
async fn include_path_partial_found_before_general_resolver() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    write(&root, "styles/vendor/_buttons.scss", ".btn { color: red; }");
    write(&root, "styles/main.scss", "@import \"buttons\";");

    let adapter = ImporterAdapter::new(
        file_backed(ResolveOptions::bundler_style()),
        vec![root.join("styles/vendor")],
        root.join("styles"),
    );

    let out = adapter
        .import("buttons", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(out.file, root.join("styles/vendor/_buttons.scss").as_str());

    let deps: Vec<_> = adapter
        .take_dependencies()
        .iter()
        .map(|p| p.to_owned())
        .collect();
    assert_eq!(deps, [root.join("styles/vendor/_buttons.scss")]);
}

#[tokio::test]
async fn relative_import_resolved_from_importing_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    write(&root, "styles/partials/_nav.scss", "nav { display: flex; }");
    write(&root, "styles/main.scss", "@import \"partials/nav\";");

    let adapter = ImporterAdapter::new(
        file_backed(ResolveOptions::bundler_style()),
        Vec::new(),
        root.join("styles"),
    );

    let out = adapter
        .import("partials/nav", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(out.file, root.join("styles/partials/_nav.scss").as_str());
}

#[tokio::test]
async fn alias_matches_literal_request_after_expansion_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    write(
        &root,
        "node_modules/bootstrap/scss/bootstrap.scss",
        "body { margin: 0; }",
    );

    let mut general = ResolveOptions::bundler_style();
    general.alias = vec![(
        "bootstrap".to_string(),
        root.join("node_modules/bootstrap/scss/bootstrap.scss"),
    )];

    let adapter = ImporterAdapter::new(
        file_backed(general),
        vec![root.join("styles/vendor")],
        root.join("styles"),
    );

    let out = adapter
        .import("bootstrap", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(
        out.file,
        root.join("node_modules/bootstrap/scss/bootstrap.scss").as_str(),
    );
}

#[tokio::test]
async fn module_request_resolved_through_node_modules_only() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    write(&root, "node_modules/pkg/sub.scss", "a { color: blue; }");
    // a trap in the include path that must not be considered
    write(&root, "styles/vendor/pkg/sub.scss", "a { color: red; }");

    let adapter = ImporterAdapter::new(
        file_backed(ResolveOptions::bundler_style()),
        vec![root.join("styles/vendor")],
        root.join("styles"),
    );

    let out = adapter
        .import("~pkg/sub", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(out.file, root.join("node_modules/pkg/sub.scss").as_str());
}

#[tokio::test]
async fn partial_form_wins_over_plain_in_same_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    write(&root, "styles/_theme.scss", "");
    write(&root, "styles/theme.scss", "");

    let adapter = ImporterAdapter::new(
        file_backed(ResolveOptions::bundler_style()),
        Vec::new(),
        root.join("styles"),
    );

    let out = adapter
        .import("theme", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(out.file, root.join("styles/_theme.scss").as_str());
}

#[tokio::test]
async fn directory_index_found_when_no_direct_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    write(&root, "styles/theme/_index.scss", "");

    let adapter = ImporterAdapter::new(
        file_backed(ResolveOptions::bundler_style()),
        Vec::new(),
        root.join("styles"),
    );

    let out = adapter
        .import("theme", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(out.file, root.join("styles/theme/_index.scss").as_str());
}

#[tokio::test]
async fn resolved_css_loses_extension_but_dependency_keeps_it() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    write(&root, "styles/vendor/reset.css", "* { margin: 0; }");

    let mut general = ResolveOptions::bundler_style();
    general.alias = vec![(
        "reset.css".to_string(),
        root.join("styles/vendor/reset.css"),
    )];

    let adapter = ImporterAdapter::new(file_backed(general), Vec::new(), root.join("styles"));

    let out = adapter
        .import("reset.css", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(out.file, root.join("styles/vendor/reset").as_str());

    let deps: Vec<_> = adapter
        .take_dependencies()
        .iter()
        .map(|p| p.to_owned())
        .collect();
    assert_eq!(deps, [root.join("styles/vendor/reset.css")]);
}

#[tokio::test]
async fn unresolvable_specifier_round_trips_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);

    let adapter = ImporterAdapter::new(
        file_backed(ResolveOptions::bundler_style()),
        vec![root.join("styles/vendor")],
        root.join("styles"),
    );

    let out = adapter
        .import("does/not/exist", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(out.file, "does/not/exist");
    assert!(adapter.take_dependencies().is_empty());
}

#[tokio::test]
async fn explicit_extension_not_substituted() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    // only a .sass variant exists, but the request names .scss explicitly
    write(&root, "styles/theme.sass", "");

    let adapter = ImporterAdapter::new(
        file_backed(ResolveOptions::bundler_style()),
        Vec::new(),
        root.join("styles"),
    );

    let out = adapter
        .import("theme.scss", root.join("styles/main.scss").as_str())
        .await;
    assert_eq!(out.file, "theme.scss");
}

#[tokio::test]
async fn nested_import_resolves_relative_to_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = tmp_root(&dir);
    write(&root, "styles/partials/_nav.scss", "@import \"links\";");
    write(&root, "styles/partials/_links.scss", "a { color: blue; }");

    let adapter = ImporterAdapter::new(
        file_backed(ResolveOptions::bundler_style()),
        Vec::new(),
        root.join("styles"),
    );

    let out = adapter
        .import("links", root.join("styles/partials/_nav.scss").as_str())
        .await;
    assert_eq!(out.file, root.join("styles/partials/_links.scss").as_str());
}
