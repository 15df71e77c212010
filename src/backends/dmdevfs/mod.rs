//! dmdevfs: the device filesystem.
//!
//! A flat namespace: `/` lists one file per [`Device`], and each file reads
//! and writes the device directly. Devices have a fixed size, so writes past
//! the end come back short and seeks clamp to the capacity. Directories
//! cannot be created and entries cannot be removed or renamed.
//!
//! Devices come from two places: those attached to the backend with
//! [`DevFs::with_device`], shared by every context, and RAM devices listed in
//! the context configuration, private to that context:
//!
//! ```text
//! devices=ram0:4096,scratch:512
//! ```

mod device;

pub use device::{Device, RamDevice};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};
use std::sync::Arc;

use tracing::debug;

use crate::{
    Backend, Config, DMFSI_VERSION, DirEntry, Driver, DriverDir, DriverRead, DriverWrite,
    FileKind, FsError, Magic, ModuleDescriptor, Stat, Version, normalize,
};

/// Registration name.
pub const NAME: &str = "dmdevfs";

/// Module release version.
pub const MODULE_VERSION: Version = Version::new(0, 1);

/// Module descriptor with no attached devices.
pub fn descriptor() -> ModuleDescriptor {
    DevFs::new().into_descriptor()
}

/// The dmdevfs backend.
#[derive(Clone, Default)]
pub struct DevFs {
    devices: Vec<Arc<dyn Device>>,
}

impl fmt::Debug for DevFs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.devices.iter().map(|d| d.name()))
            .finish()
    }
}

impl DevFs {
    /// A backend with no attached devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device visible to every context.
    pub fn with_device(mut self, device: Arc<dyn Device>) -> Self {
        self.devices.push(device);
        self
    }

    /// Module descriptor serving this backend.
    pub fn into_descriptor(self) -> ModuleDescriptor {
        ModuleDescriptor {
            name: NAME,
            module_version: MODULE_VERSION,
            interface_version: DMFSI_VERSION,
            backend: Arc::new(self),
        }
    }
}

fn valid_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('/')
}

fn parse_devices(list: &str) -> Result<Vec<Arc<dyn Device>>, FsError> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, capacity) = item.split_once(':').ok_or_else(|| {
                FsError::config(format!("device `{item}` must be `name:capacity`"))
            })?;
            let capacity = capacity.trim().parse::<usize>().map_err(|_| {
                FsError::config(format!("device `{item}` has a bad capacity"))
            })?;
            let device: Arc<dyn Device> = Arc::new(RamDevice::new(name.trim(), capacity)?);
            Ok(device)
        })
        .collect()
}

impl Backend for DevFs {
    fn magic(&self) -> Magic {
        Magic::DMDEVFS
    }

    fn mount(&self, config: &mut Config) -> Result<Box<dyn Driver>, FsError> {
        let mut devices = self.devices.clone();
        if let Some(list) = config.take("devices") {
            devices.extend(parse_devices(&list)?);
        }

        let mut table = BTreeMap::new();
        for device in devices {
            let name = device.name().to_string();
            if !valid_name(&name) {
                return Err(FsError::config(format!("invalid device name `{name}`")));
            }
            if table.insert(name.clone(), device).is_some() {
                return Err(FsError::config(format!("duplicate device `{name}`")));
            }
        }
        debug!(devices = table.len(), "dmdevfs mounted");
        Ok(Box::new(DevDriver { devices: table }))
    }
}

enum Node<'a> {
    Root,
    Device(&'a Arc<dyn Device>),
}

/// Driver over a fixed set of devices, listed in name order.
struct DevDriver {
    devices: BTreeMap<String, Arc<dyn Device>>,
}

impl DevDriver {
    fn node(&self, path: &Path) -> Result<Node<'_>, FsError> {
        let path = normalize(path);
        if path == Path::new("/") {
            return Ok(Node::Root);
        }
        path.parent()
            .filter(|parent| *parent == Path::new("/"))
            .and_then(|_| path.file_name()?.to_str())
            .and_then(|name| self.devices.get(name))
            .map(Node::Device)
            .ok_or(FsError::NotFound { path })
    }

    fn device(&self, path: &Path) -> Result<&Arc<dyn Device>, FsError> {
        match self.node(path)? {
            Node::Device(device) => Ok(device),
            Node::Root => Err(FsError::NotAFile {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn device_stat(device: &dyn Device) -> Stat {
    Stat {
        kind: FileKind::File,
        size: device.capacity(),
        attributes: device.attributes(),
        modified: None,
    }
}

impl DriverRead for DevDriver {
    fn stat(&self, path: &Path) -> Result<Stat, FsError> {
        match self.node(path)? {
            Node::Root => Ok(Stat::directory()),
            Node::Device(device) => Ok(device_stat(device.as_ref())),
        }
    }

    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> Result<usize, FsError> {
        self.device(path)?.read_at(offset, buf)
    }

    fn clamp_position(&self, path: &Path, position: u64) -> Result<u64, FsError> {
        Ok(position.min(self.device(path)?.capacity()))
    }
}

impl DriverWrite for DevDriver {
    fn create(&self, path: &Path) -> Result<(), FsError> {
        match self.node(path) {
            Ok(Node::Device(_)) => Ok(()),
            Ok(Node::Root) => Err(FsError::NotAFile {
                path: path.to_path_buf(),
            }),
            Err(_) => Err(FsError::NotSupported { operation: "create" }),
        }
    }

    fn write_at(&self, path: &Path, offset: u64, data: &[u8]) -> Result<usize, FsError> {
        self.device(path)?.write_at(offset, data)
    }

    /// Devices cannot be resized; only the target is checked.
    fn set_len(&self, path: &Path, _: u64) -> Result<(), FsError> {
        self.device(path).map(|_| ())
    }

    fn flush(&self, path: &Path) -> Result<(), FsError> {
        self.device(path)?.flush()
    }

    fn sync(&self) -> Result<(), FsError> {
        self.devices.values().try_for_each(|device| device.flush())
    }

    fn remove(&self, _: &Path) -> Result<(), FsError> {
        Err(FsError::NotSupported { operation: "unlink" })
    }

    fn rename(&self, _: &Path, _: &Path) -> Result<(), FsError> {
        Err(FsError::NotSupported { operation: "rename" })
    }
}

impl DriverDir for DevDriver {
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        match self.node(path)? {
            Node::Root => Ok(self
                .devices
                .iter()
                .map(|(name, device)| DirEntry::from_stat(name.as_str(), &device_stat(device.as_ref())))
                .collect()),
            Node::Device(_) => Err(FsError::NotADirectory {
                path: path.to_path_buf(),
            }),
        }
    }

    fn create_dir(&self, _: &Path) -> Result<(), FsError> {
        Err(FsError::NotSupported { operation: "mkdir" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Attributes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn p(s: &str) -> &Path {
        Path::new(s)
    }

    fn mount(backend: &DevFs, text: &str) -> Result<Box<dyn Driver>, FsError> {
        let mut config = Config::parse(text)?;
        let driver = backend.mount(&mut config)?;
        config.finish()?;
        Ok(driver)
    }

    struct Counted {
        flushes: AtomicUsize,
    }

    impl Device for Counted {
        fn name(&self) -> &str {
            "counted"
        }
        fn capacity(&self) -> u64 {
            8
        }
        fn read_at(&self, _: u64, _: &mut [u8]) -> Result<usize, FsError> {
            Ok(0)
        }
        fn write_at(&self, _: u64, data: &[u8]) -> Result<usize, FsError> {
            Ok(data.len())
        }
        fn flush(&self) -> Result<(), FsError> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn attributes(&self) -> Attributes {
            Attributes::SYSTEM | Attributes::HIDDEN
        }
    }

    #[test]
    fn lists_devices_in_name_order() {
        let d = mount(&DevFs::new(), "devices=zeta:4, alpha:16").unwrap();
        let entries = d.list(p("/")).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert_eq!(entries[0].size, 16);
        assert_eq!(entries[0].kind, FileKind::File);
        assert!(entries[0].attributes.contains(Attributes::SYSTEM));
    }

    #[test]
    fn empty_config_has_no_devices() {
        let d = mount(&DevFs::new(), "").unwrap();
        assert!(d.list(p("/")).unwrap().is_empty());
        assert!(d.stat(p("/")).unwrap().is_dir());
    }

    #[test]
    fn bad_device_specs() {
        for text in [
            "devices=ram0",
            "devices=ram0:big",
            "devices=a:1,a:2",
            "devices=..:1",
            "devices=a/b:1",
        ] {
            assert!(
                matches!(mount(&DevFs::new(), text), Err(FsError::Config { .. })),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn attached_devices_are_shared() {
        let dev: Arc<dyn Device> = Arc::new(RamDevice::new("shared", 4).unwrap());
        let backend = DevFs::new().with_device(dev);
        let a = mount(&backend, "").unwrap();
        let b = mount(&backend, "").unwrap();
        a.write_at(p("/shared"), 0, b"hi").unwrap();
        let mut buf = [0u8; 2];
        b.read_at(p("/shared"), 0, &mut buf).unwrap();
        assert_eq!(&buf, b"hi");

        assert!(matches!(
            mount(&backend, "devices=shared:1"),
            Err(FsError::Config { .. })
        ));
    }

    #[test]
    fn namespace_is_flat() {
        let d = mount(&DevFs::new(), "devices=ram0:4").unwrap();
        assert!(matches!(d.stat(p("/nope")), Err(FsError::NotFound { .. })));
        assert!(matches!(
            d.stat(p("/ram0/inner")),
            Err(FsError::NotFound { .. })
        ));
        assert!(matches!(
            d.list(p("/ram0")),
            Err(FsError::NotADirectory { .. })
        ));
        assert!(matches!(
            d.read_at(p("/"), 0, &mut [0u8; 1]),
            Err(FsError::NotAFile { .. })
        ));
    }

    #[test]
    fn structural_changes_are_unsupported() {
        let d = mount(&DevFs::new(), "devices=ram0:4").unwrap();
        assert!(matches!(
            d.create_dir(p("/d")),
            Err(FsError::NotSupported { .. })
        ));
        assert!(matches!(
            d.remove(p("/ram0")),
            Err(FsError::NotSupported { .. })
        ));
        assert!(matches!(
            d.rename(p("/ram0"), p("/ram1")),
            Err(FsError::NotSupported { .. })
        ));
        assert!(matches!(
            d.create(p("/new")),
            Err(FsError::NotSupported { .. })
        ));
        d.create(p("/ram0")).unwrap();
        d.set_len(p("/ram0"), 0).unwrap();
    }

    #[test]
    fn seeks_clamp_to_capacity() {
        let d = mount(&DevFs::new(), "devices=ram0:4").unwrap();
        assert_eq!(d.clamp_position(p("/ram0"), 2).unwrap(), 2);
        assert_eq!(d.clamp_position(p("/ram0"), 100).unwrap(), 4);
    }

    #[test]
    fn sync_flushes_every_device() {
        let counted = Arc::new(Counted {
            flushes: AtomicUsize::new(0),
        });
        let backend = DevFs::new().with_device(counted.clone());
        let d = mount(&backend, "").unwrap();
        d.flush(p("/counted")).unwrap();
        backend.unmount(d.as_ref()).unwrap();
        assert_eq!(counted.flushes.load(Ordering::SeqCst), 2);
        assert!(d.stat(p("/counted")).unwrap().attributes.contains(Attributes::HIDDEN));
    }

    #[test]
    fn descriptor_matches_backend() {
        let d = descriptor();
        assert_eq!(d.name, NAME);
        assert_eq!(d.backend.magic(), Magic::DMDEVFS);
        assert_eq!(d.module_version, MODULE_VERSION);
    }
}
