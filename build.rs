use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use zstd::bulk::compress as zstd_compress;

#[allow(dead_code)]
#[path = "src/guide.rs"]
mod guide_model;
use guide_model::{FormDescriptor, GuideSource};

const GUIDES_COMPRESSION_LEVEL: i32 = 5;

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    let source = load_guides(&manifest_dir)?;
    validate(&source)?;
    embed_guides(&source, &out_dir)?;
    Ok(())
}

fn load_guides(manifest_dir: &Path) -> Result<GuideSource, Box<dyn Error>> {
    let guides_file = manifest_dir.join("data/instructions.json");
    println!("cargo:rerun-if-changed={}", guides_file.display());
    if !guides_file.exists() {
        panic!(
            "Missing {}. The default guide document is compiled into the binary.",
            guides_file.display()
        );
    }
    let bytes = fs::read(&guides_file)?;
    let source: GuideSource = serde_json::from_slice(&bytes)
        .map_err(|err| format!("Failed to parse {}: {err}", guides_file.display()))?;
    Ok(source)
}

fn validate(source: &GuideSource) -> Result<(), Box<dyn Error>> {
    if source.instructions.is_empty() {
        return Err("data/instructions.json contains no guides".into());
    }
    let mut form_ids: Vec<&str> = Vec::new();
    for (idx, guide) in source.instructions.iter().enumerate() {
        if guide.title.trim().is_empty() {
            return Err(format!("Guide #{} has an empty title", idx + 1).into());
        }
        if let Some(form) = &guide.form {
            if form_ids.contains(&form.id()) {
                return Err(format!("Duplicate form id {:?}", form.id()).into());
            }
            form_ids.push(form.id());
            if let FormDescriptor::Input(input) = form {
                for field in &input.fields {
                    if field.kind.as_str() == "select" && field.options.is_empty() {
                        return Err(format!(
                            "Select field {:?} in form {:?} has no options",
                            field.id, input.id
                        )
                        .into());
                    }
                }
            }
        }
    }
    Ok(())
}

fn embed_guides(source: &GuideSource, out_dir: &Path) -> Result<(), Box<dyn Error>> {
    let minified = serde_json::to_vec(source)?;
    let compressed = zstd_compress(&minified, GUIDES_COMPRESSION_LEVEL)
        .map_err(|err| format!("Failed to compress guide document: {err}"))?;
    let guides_path = out_dir.join("instructions.json.zst");
    fs::write(&guides_path, compressed)?;
    println!("cargo:rustc-env=PLAYBOOK_GUIDES={}", guides_path.display());
    Ok(())
}
