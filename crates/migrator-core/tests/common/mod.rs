//! Fixtures and fake collaborators shared by the engine integration tests.

#![allow(dead_code)]

use migrator_core::scaffold::{Scaffold, ScaffoldRequest};
use migrator_core::{Error, VersionLookup};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

pub const TEST_SETUP_VERSION: &str = "3.0.1";

pub fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&read(path)).unwrap()
}

/// Every path under `root`, relative and sorted.
pub fn snapshot_tree(root: &Path) -> Vec<String> {
    let mut paths: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    paths.sort();
    paths
}

/// A classic addon with a dummy app, auxiliary files and a lockfile.
pub fn write_addon(root: &Path, lockfile: Option<&str>) {
    write(
        &root.join("package.json"),
        r#"{
  "name": "my-addon",
  "version": "1.2.3",
  "scripts": { "test": "ember test" },
  "dependencies": { "ember-cli-babel": "^7.26.11" },
  "devDependencies": {
    "ember-source": "~4.8.0",
    "ember-qunit": "^6.0.0",
    "@embroider/test-setup": "^1.0.0",
    "ember-try": "^2.0.0"
  }
}
"#,
    );
    if let Some(lockfile) = lockfile {
        write(&root.join(lockfile), "");
    }
    write(&root.join("index.js"), "module.exports = { name: require('./package').name };\n");
    write(&root.join("addon/components/foo.js"), "export default class Foo {}\n");
    write(&root.join("app/components/foo.js"), "export { default } from 'my-addon/components/foo';\n");
    write(
        &root.join("ember-cli-build.js"),
        "const EmberAddon = require('ember-cli/lib/broccoli/ember-addon');\n\
         module.exports = function (defaults) {\n  let app = new EmberAddon(defaults, {});\n  return app.toTree();\n};\n",
    );
    write(&root.join("testem.js"), "module.exports = {};\n");
    write(&root.join("config/ember-try.js"), "module.exports = async function () {};\n");
    write(&root.join("config/environment.js"), "module.exports = function () {};\n");
    write(&root.join(".eslintrc.js"), "module.exports = {};\n");
    write(&root.join(".template-lintrc.js"), "module.exports = {};\n");
    write(&root.join(".watchmanconfig"), "{}\n");
    write(&root.join(".ember-cli"), "{}\n");
    write(&root.join(".gitignore"), "node_modules/\n");
    write(&root.join("README.md"), "# my-addon\n");
    write(&root.join("vendor/.gitkeep"), "");
    write(&root.join("node_modules/ember-source/index.js"), "");
    write(
        &root.join("tests/test-helper.js"),
        "import Application from 'dummy/app';\nimport config from 'dummy/config/environment';\n",
    );
    write(&root.join("tests/index.html"), "<html></html>\n");
    write(&root.join("tests/dummy/app/app.js"), "export default class App {}\n");
    write(&root.join("tests/unit/foo-test.js"), "import { module } from 'qunit';\n");
    write(
        &root.join("tests/integration/components/foo-test.js"),
        "import { render } from '@ember/test-helpers';\n",
    );
}

/// Resolves every lookup to [`TEST_SETUP_VERSION`], counting queries.
#[derive(Default)]
pub struct FixedVersion {
    pub calls: Cell<usize>,
}

impl VersionLookup for FixedVersion {
    async fn latest_version(&self, _name: &str) -> Result<String, Error> {
        self.calls.set(self.calls.get() + 1);
        Ok(TEST_SETUP_VERSION.to_string())
    }
}

pub struct OfflineRegistry;

impl VersionLookup for OfflineRegistry {
    async fn latest_version(&self, name: &str) -> Result<String, Error> {
        Err(Error::RegistryLookup {
            name: name.to_string(),
            reason: "offline".into(),
        })
    }
}

/// Writes a minimal app blueprint.
#[derive(Default)]
pub struct FakeBlueprint {
    pub requests: RefCell<Vec<PathBuf>>,
}

impl Scaffold for FakeBlueprint {
    async fn scaffold(&self, request: &ScaffoldRequest) -> Result<(), Error> {
        self.requests.borrow_mut().push(request.path.clone());
        let app = &request.path;
        write(
            &app.join("package.json"),
            &format!(
                r#"{{
  "name": "{}",
  "private": true,
  "scripts": {{ "test": "ember test" }},
  "devDependencies": {{
    "ember-source": "~5.4.0",
    "ember-qunit": "^8.0.1",
    "ember-welcome-page": "^7.0.2",
    "ember-fetch": "^8.1.2"
  }}
}}
"#,
                request.name
            ),
        );
        write(&app.join("app/app.js"), "export default class App {}\n");
        write(&app.join("app/templates/application.hbs"), "<WelcomePage />\n");
        write(&app.join("ember-cli-build.js"), "// blueprint\n");
        Ok(())
    }
}

pub struct BrokenBlueprint;

impl Scaffold for BrokenBlueprint {
    async fn scaffold(&self, request: &ScaffoldRequest) -> Result<(), Error> {
        Err(Error::Scaffold {
            name: request.name.clone(),
            path: request.path.clone(),
            reason: "generator crashed".into(),
        })
    }
}
