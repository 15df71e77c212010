//! Basic usage of the DMFSI driver layer.
//!
//! This example loads the built-in backends, talks to them through the
//! DMFSI calls, and then plugs in a tiny backend of its own.
//!
//! Run with: `cargo run --example basic_usage`

use dmfsi::backends::{dmdevfs, dmdfs};
use dmfsi::*;
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// Step 1: A minimal backend
// =============================================================================

/// Serves a single read-only file, `/motd`, whose text comes from the
/// `text=` configuration key.
struct Motd;

struct MotdDriver {
    text: Vec<u8>,
}

impl MotdDriver {
    fn check(&self, path: &Path) -> Result<(), FsError> {
        if path == Path::new("/motd") {
            Ok(())
        } else {
            Err(FsError::NotFound {
                path: path.to_path_buf(),
            })
        }
    }

    fn refuse(operation: &'static str) -> FsError {
        FsError::NotSupported { operation }
    }
}

impl DriverRead for MotdDriver {
    fn stat(&self, path: &Path) -> Result<Stat, FsError> {
        if path == Path::new("/") {
            return Ok(Stat::directory());
        }
        self.check(path)?;
        let mut stat = Stat::file(self.text.len() as u64);
        stat.attributes = Attributes::READ_ONLY;
        Ok(stat)
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        self.check(path)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.text.len());
        let n = buf.len().min(self.text.len() - start);
        buf[..n].copy_from_slice(&self.text[start..start + n]);
        Ok(n)
    }
}

impl DriverWrite for MotdDriver {
    fn create(&self, _: &Path) -> Result<(), FsError> {
        Err(Self::refuse("create"))
    }

    fn write_at(&self, _: &Path, _: u64, _: &[u8]) -> Result<usize, FsError> {
        Err(Self::refuse("write"))
    }

    fn set_len(&self, _: &Path, _: u64) -> Result<(), FsError> {
        Err(Self::refuse("set_len"))
    }

    fn remove(&self, _: &Path) -> Result<(), FsError> {
        Err(Self::refuse("remove"))
    }

    fn rename(&self, _: &Path, _: &Path) -> Result<(), FsError> {
        Err(Self::refuse("rename"))
    }
}

impl DriverDir for MotdDriver {
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let stat = self.stat(Path::new("/motd"))?;
        if path == Path::new("/") {
            Ok(vec![DirEntry::from_stat("motd", &stat)])
        } else {
            Err(FsError::NotADirectory {
                path: path.to_path_buf(),
            })
        }
    }

    fn create_dir(&self, _: &Path) -> Result<(), FsError> {
        Err(Self::refuse("create_dir"))
    }
}

impl Backend for Motd {
    fn magic(&self) -> Magic {
        Magic(u32::from_be_bytes(*b"MOTD"))
    }

    fn mount(&self, config: &mut Config) -> Result<Box<dyn Driver>, FsError> {
        let text = config.take("text").unwrap_or_else(|| "hello".to_string());
        Ok(Box::new(MotdDriver {
            text: text.into_bytes(),
        }))
    }
}

// =============================================================================
// Step 2: Use it
// =============================================================================

fn main() -> Result<(), FsError> {
    println!("=== dmfsi Basic Usage Example ===\n");

    // --- Loading modules ---
    println!("1. Loading modules...");
    let registry = Registry::new();
    let mut modules = vec![
        Module::new(dmdfs::descriptor()),
        Module::new(dmdevfs::descriptor()),
        Module::new(ModuleDescriptor {
            name: "motd",
            module_version: Version::new(0, 1),
            interface_version: DMFSI_VERSION,
            backend: Arc::new(Motd),
        }),
    ];
    for module in &mut modules {
        module.preinit();
        module.init(&registry, "")?;
    }
    for (name, version) in registry.implementations() {
        println!("   registered {name} {version}");
    }

    // --- Files ---
    println!("\n2. Writing and reading a file on dmdfs...");
    let fs = registry.resolve(dmdfs::NAME, VersionReq::Compatible(DMFSI_VERSION))?;
    let ctx = fs.init("driver=memory")?;
    fs.mkdir(&ctx, "/notes")?;

    let mode = OpenMode::from_flags("w+").ok_or(FsError::config("bad mode"))?;
    let f = fs.fopen(&ctx, "/notes/today.txt", mode, Attributes::ARCHIVE)?;
    fs.fwrite(&ctx, f, b"buy milk\n")?;
    fs.lseek(&ctx, f, 0, Whence::Start)?;
    let mut buf = vec![0u8; fs.size(&ctx, f)? as usize];
    fs.fread(&ctx, f, &mut buf)?;
    println!("   read back: {:?}", String::from_utf8_lossy(&buf));
    fs.fclose(&ctx, f)?;

    // --- Directories ---
    println!("\n3. Listing /notes...");
    let dir = fs.opendir(&ctx, "/notes")?;
    while let Some(entry) = fs.readdir(&ctx, dir)? {
        println!("   {} ({} bytes)", entry.name, entry.size);
    }
    fs.closedir(&ctx, dir)?;

    // --- Errors ---
    println!("\n4. Errors carry a status code...");
    let missing = fs.fopen(&ctx, "/nope", OpenMode::READ, Attributes::NONE);
    println!("   fopen(/nope): {:?} ({})", Status::of(&missing), Status::of(&missing).code());
    let report = fs.deinit(ctx.clone())?;
    println!("   context closed, leaked handles: {}", report.leaked());
    let stale = fs.stat(&ctx, "/notes");
    println!("   stat after deinit: {:?}", Status::of(&stale));

    // --- Devices ---
    println!("\n5. Device files on dmdevfs...");
    let dev = registry.resolve(dmdevfs::NAME, VersionReq::Compatible(DMFSI_VERSION))?;
    let ctx = dev.init("devices=ram0:4")?;
    let f = dev.fopen(&ctx, "/ram0", OpenMode::READ_WRITE, Attributes::NONE)?;
    let written = dev.fwrite(&ctx, f, b"abcdef")?;
    println!("   wrote {written} of 6 bytes to a 4-byte device");
    println!("   seek to 100 lands at {}", dev.lseek(&ctx, f, 100, Whence::Start)?);
    dev.fclose(&ctx, f)?;
    dev.deinit(ctx)?;

    // --- Custom backend ---
    println!("\n6. The custom backend...");
    let motd = registry.resolve("motd", VersionReq::Exact(DMFSI_VERSION))?;
    let ctx = motd.init("text=welcome aboard")?;
    let f = motd.fopen(&ctx, "/motd", OpenMode::READ, Attributes::NONE)?;
    let mut line = String::new();
    while let Some(byte) = motd.getc(&ctx, f)? {
        line.push(char::from(byte));
    }
    println!("   /motd says: {line}");
    let denied = motd.fopen(&ctx, "/motd", OpenMode::APPEND, Attributes::NONE);
    println!("   opening it for append: {:?}", Status::of(&denied));
    motd.fclose(&ctx, f)?;

    // --- Unloading ---
    println!("\n7. Unloading modules (live contexts are force-closed)...");
    for module in &mut modules {
        let name = module.descriptor().name;
        println!("   {name}: {:?}", module.deinit(&registry)?);
    }
    println!("   context still valid: {}", motd.context_is_valid(&ctx));

    println!("\n=== Done ===");
    Ok(())
}
