//! The build driver: cache decision, input enumeration, the pack loop,
//! page/sidecar emission and subdirectory-split aggregation.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use crunch_core::{export, render_page, AtlasConfig, Bitmap, Packer};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cache;

/// Everything one invocation needs, resolved up front and threaded through
/// explicitly.
#[derive(Debug)]
pub struct BuildRequest {
    pub out_dir: PathBuf,
    pub name: String,
    pub inputs: Vec<PathBuf>,
    pub config: AtlasConfig,
    pub xml: bool,
    pub json: bool,
    pub binary: bool,
    pub force: bool,
    pub use_time: bool,
    pub split: bool,
    pub no_zero: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildOutcome {
    Built,
    UpToDate,
}

pub fn build(req: &BuildRequest, arg_hash: u64) -> anyhow::Result<()> {
    if !req.out_dir.as_os_str().is_empty() {
        fs::create_dir_all(&req.out_dir)
            .with_context(|| format!("failed to create {}", req.out_dir.display()))?;
    }
    if req.split {
        build_split(req, arg_hash)
    } else {
        if build_atlas(req, arg_hash, &req.name, &req.inputs, "", false)? == BuildOutcome::UpToDate
        {
            println!("atlas is unchanged: {}", req.name);
        }
        Ok(())
    }
}

/// Builds one atlas (all pages plus sidecars) under `name`.
fn build_atlas(
    req: &BuildRequest,
    arg_hash: u64,
    name: &str,
    inputs: &[PathBuf],
    prefix: &str,
    in_split: bool,
) -> anyhow::Result<BuildOutcome> {
    let cfg = &req.config;

    let mut fingerprint = arg_hash;
    for input in inputs {
        if input.is_dir() {
            cache::hash_tree(&mut fingerprint, input, req.use_time)?;
        } else {
            cache::hash_file(&mut fingerprint, input, req.use_time)?;
        }
    }

    let hash_path = req.out_dir.join(format!("{name}.hash"));
    if !req.force && cache::load(&hash_path) == Some(fingerprint) {
        return Ok(BuildOutcome::UpToDate);
    }

    remove_stale_outputs(&req.out_dir, name)?;

    info!("loading images");
    let mut bitmaps = collect_bitmaps(inputs, prefix, cfg)?;
    // Stable ascending area sort; the packer consumes from the tail, so the
    // largest bitmaps are placed first.
    bitmaps.sort_by_key(|b| b.width as u64 * b.height as u64);

    let mut packers: Vec<Packer> = Vec::new();
    while !bitmaps.is_empty() {
        debug!(remaining = bitmaps.len(), "packing images");
        let mut packer = Packer::new(cfg.max_width, cfg.max_height, cfg.padding, cfg.stretch);
        packer.pack(&mut bitmaps, cfg.unique, cfg.rotate, cfg.heuristic);
        if packer.bitmaps.is_empty() {
            let bitmap = bitmaps.last().expect("loop guard");
            bail!("packing failed, could not fit bitmap: {}", bitmap.name);
        }
        packers.push(packer);
    }

    let no_zero = req.no_zero && packers.len() == 1;
    let page_name = |i: usize| {
        if no_zero {
            name.to_string()
        } else {
            format!("{name}{i}")
        }
    };

    for (i, packer) in packers.iter().enumerate() {
        let path = req.out_dir.join(format!("{}.png", page_name(i)));
        info!(path = %path.display(), "writing png");
        render_page(packer)
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if req.binary {
        let path = req.out_dir.join(format!("{name}.bin"));
        info!(path = %path.display(), "writing bin");
        let mut w = BufWriter::new(create_output(&path)?);
        if !in_split {
            export::write_bin_header(&mut w, cfg.trim, cfg.rotate, cfg.string_format)?;
        }
        export::write_short(&mut w, packers.len() as i16)?;
        for (i, packer) in packers.iter().enumerate() {
            export::write_bin_page(
                &mut w,
                &page_name(i),
                packer,
                cfg.trim,
                cfg.rotate,
                cfg.string_format,
            )?;
        }
        w.flush()?;
    }

    if req.xml {
        let path = req.out_dir.join(format!("{name}.xml"));
        info!(path = %path.display(), "writing xml");
        let mut w = BufWriter::new(create_output(&path)?);
        if !in_split {
            write_xml_wrapper_open(&mut w, cfg)?;
        }
        for (i, packer) in packers.iter().enumerate() {
            export::write_xml_page(&mut w, &page_name(i), packer, cfg.trim, cfg.rotate)?;
        }
        if !in_split {
            writeln!(w, "</atlas>")?;
        }
        w.flush()?;
    }

    if req.json {
        let path = req.out_dir.join(format!("{name}.json"));
        info!(path = %path.display(), "writing json");
        let mut w = BufWriter::new(create_output(&path)?);
        if !in_split {
            write_json_wrapper_open(&mut w, cfg)?;
        }
        for (i, packer) in packers.iter().enumerate() {
            export::write_json_page(&mut w, &page_name(i), packer, cfg.trim, cfg.rotate)?;
            if !in_split {
                if i != packers.len() - 1 {
                    write!(w, ",")?;
                }
                writeln!(w)?;
            }
        }
        if !in_split {
            writeln!(w, "\t]")?;
            writeln!(w, "}}")?;
        }
        w.flush()?;
    }

    cache::save(&hash_path, fingerprint)
        .with_context(|| format!("failed to write {}", hash_path.display()))?;
    Ok(BuildOutcome::Built)
}

/// One atlas per immediate subdirectory of the first directory input, then
/// the sub-atlas sidecars concatenated into the top-level ones.
fn build_split(req: &BuildRequest, arg_hash: u64) -> anyhow::Result<()> {
    let root = req
        .inputs
        .iter()
        .find(|p| p.extension().and_then(|e| e.to_str()) != Some("png"))
        .context("could not find directories in input")?;

    let mut subdirs: Vec<PathBuf> = fs::read_dir(root)
        .with_context(|| format!("failed to read directory: {}", root.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();

    let name_prefix = format!("{}_", req.name);
    let mut skipped = true;
    for sub in &subdirs {
        let sub_name = sub
            .file_name()
            .and_then(|s| s.to_str())
            .with_context(|| format!("invalid subdirectory name: {}", sub.display()))?
            .to_string();
        let atlas_name = format!("{name_prefix}{sub_name}");
        let outcome = build_atlas(
            req,
            arg_hash,
            &atlas_name,
            std::slice::from_ref(sub),
            &format!("{sub_name}/"),
            true,
        )?;
        if outcome == BuildOutcome::Built {
            skipped = false;
        }
    }

    if skipped {
        println!("atlas is unchanged: {}", req.name);
        return Ok(());
    }

    for ext in ["bin", "xml", "json"] {
        remove_if_exists(&req.out_dir.join(format!("{}.{ext}", req.name)))?;
    }

    let cfg = &req.config;
    if req.binary {
        let path = req.out_dir.join(format!("{}.bin", req.name));
        info!(path = %path.display(), "writing bin");
        let subs = find_sidecars(&req.out_dir, &name_prefix, "bin")?;
        let mut w = BufWriter::new(create_output(&path)?);
        export::write_bin_header(&mut w, cfg.trim, cfg.rotate, cfg.string_format)?;
        // sub-atlas files start with their own texture count; the aggregate
        // re-emits the sum, then streams the remainders
        let mut bodies = Vec::with_capacity(subs.len());
        let mut total: i16 = 0;
        for sub in &subs {
            let bytes =
                fs::read(sub).with_context(|| format!("failed to read {}", sub.display()))?;
            if bytes.len() < 2 {
                bail!("malformed sub-atlas sidecar: {}", sub.display());
            }
            total += i16::from_le_bytes([bytes[0], bytes[1]]);
            bodies.push(bytes);
        }
        export::write_short(&mut w, total)?;
        for body in &bodies {
            w.write_all(&body[2..])?;
        }
        w.flush()?;
    }

    if req.xml {
        let path = req.out_dir.join(format!("{}.xml", req.name));
        info!(path = %path.display(), "writing xml");
        let subs = find_sidecars(&req.out_dir, &name_prefix, "xml")?;
        let mut w = BufWriter::new(create_output(&path)?);
        write_xml_wrapper_open(&mut w, cfg)?;
        for sub in &subs {
            let body =
                fs::read(sub).with_context(|| format!("failed to read {}", sub.display()))?;
            w.write_all(&body)?;
        }
        writeln!(w, "</atlas>")?;
        w.flush()?;
    }

    if req.json {
        let path = req.out_dir.join(format!("{}.json", req.name));
        info!(path = %path.display(), "writing json");
        let subs = find_sidecars(&req.out_dir, &name_prefix, "json")?;
        let mut w = BufWriter::new(create_output(&path)?);
        write_json_wrapper_open(&mut w, cfg)?;
        for (i, sub) in subs.iter().enumerate() {
            let body =
                fs::read(sub).with_context(|| format!("failed to read {}", sub.display()))?;
            w.write_all(&body)?;
            if i != subs.len() - 1 {
                write!(w, ",")?;
            }
            writeln!(w)?;
        }
        writeln!(w, "\t]")?;
        writeln!(w, "}}")?;
        w.flush()?;
    }

    Ok(())
}

fn write_xml_wrapper_open<W: Write>(w: &mut W, cfg: &AtlasConfig) -> std::io::Result<()> {
    writeln!(w, "<atlas>")?;
    writeln!(w, "\t<trim>{}</trim>", cfg.trim)?;
    // the closing tag mismatch is part of the established file format
    writeln!(w, "\t<rotate>{}</trim>", cfg.rotate)
}

fn write_json_wrapper_open<W: Write>(w: &mut W, cfg: &AtlasConfig) -> std::io::Result<()> {
    writeln!(w, "{{")?;
    writeln!(w, "\t\"trim\": {},", cfg.trim)?;
    writeln!(w, "\t\"rotate\": {},", cfg.rotate)?;
    writeln!(w, "\t\"textures\": [")
}

fn create_output(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

/// Deletes the previous build's outputs. Page removal covers
/// `<name>0.png`‥`<name>15.png`; atlases that needed more than 16 pages
/// leave the extra pages behind.
fn remove_stale_outputs(out_dir: &Path, name: &str) -> anyhow::Result<()> {
    for ext in ["hash", "bin", "xml", "json", "png"] {
        remove_if_exists(&out_dir.join(format!("{name}.{ext}")))?;
    }
    for i in 0..16 {
        remove_if_exists(&out_dir.join(format!("{name}{i}.png")))?;
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// Enumerates inputs into named bitmaps. Directories are walked recursively
/// for `.png` files; names are the prefix plus the root-relative path,
/// forward-slash separated, without extension.
fn collect_bitmaps(
    inputs: &[PathBuf],
    prefix: &str,
    cfg: &AtlasConfig,
) -> anyhow::Result<Vec<Bitmap>> {
    let mut bitmaps = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("failed to walk directory: {}", input.display()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("png") {
                    continue;
                }
                let rel = path
                    .strip_prefix(input)
                    .expect("walked entries live under their root")
                    .with_extension("");
                let name = format!("{prefix}{}", slash_name(&rel));
                debug!(path = %path.display(), name, "loading");
                let bitmap = Bitmap::load(path, name, cfg.premultiply, cfg.trim)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                bitmaps.push(bitmap);
            }
        } else {
            let name = format!("{prefix}{}", slash_name(&input.with_extension("")));
            debug!(path = %input.display(), name, "loading");
            let bitmap = Bitmap::load(input, name, cfg.premultiply, cfg.trim)
                .with_context(|| format!("failed to load {}", input.display()))?;
            bitmaps.push(bitmap);
        }
    }
    Ok(bitmaps)
}

fn slash_name(path: &Path) -> String {
    path.iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Sub-atlas sidecars on disk: `<prefix>*.<ext>` in the output directory,
/// sorted for deterministic aggregation.
fn find_sidecars(out_dir: &Path, prefix: &str, ext: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(out_dir)
        .with_context(|| format!("failed to read directory: {}", out_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let starts = path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.starts_with(prefix));
        if starts && path.extension().and_then(|e| e.to_str()) == Some(ext) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
