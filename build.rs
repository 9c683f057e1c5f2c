use std::collections::BTreeMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LOCALE: &str = "en-US";

fn main() {
    let locales_dir = Path::new("locales");
    println!("cargo:rerun-if-changed={}", locales_dir.display());

    let mut locales = BTreeMap::new();
    let mut paths = fs::read_dir(locales_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
                .collect::<Vec<PathBuf>>()
        })
        .unwrap_or_default();
    paths.sort();

    for path in paths {
        println!("cargo:rerun-if-changed={}", path.display());
        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|error| panic!("failed to read {}: {error}", path.display()));
        let table: toml::Table = toml::from_str(&content)
            .unwrap_or_else(|error| panic!("failed to parse {}: {error}", path.display()));
        let mut entries = BTreeMap::new();
        flatten("", &table, &mut entries);
        locales.insert(locale.to_string(), entries);
    }

    let mut generated = String::new();
    writeln!(generated, "pub const DEFAULT_LOCALE: &str = {DEFAULT_LOCALE:?};").unwrap();
    writeln!(generated, "pub static LOCALES: &[(&str, &[(&str, &str)])] = &[").unwrap();
    for (locale, entries) in &locales {
        writeln!(generated, "    ({locale:?}, &[").unwrap();
        for (key, value) in entries {
            writeln!(generated, "        ({key:?}, {value:?}),").unwrap();
        }
        writeln!(generated, "    ]),").unwrap();
    }
    writeln!(generated, "];").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("rxform_i18n_generated.rs"), generated)
        .expect("failed to write generated i18n catalog");
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten(&path, nested, out),
            toml::Value::String(text) => {
                out.insert(path, text.clone());
            }
            other => {
                out.insert(path, other.to_string());
            }
        }
    }
}
