//! Versioned binary network files.
//!
//! Layout, all integers little-endian:
//!
//! | field      | bytes                 |
//! |------------|-----------------------|
//! | magic      | 4, `9.0f32` LE        |
//! | layers L   | 1                     |
//! | sizes      | 2 × L                 |
//! | per layer 1..L-1: biases  | 4 × size[i]             |
//! | per layer 1..L-1: weights | 4 × size[i-1] × size[i], row-major by output node |
//! | terminator | 1, `0xFF`             |
//!
//! Floats are IEEE-754 binary32, little-endian, so files move between
//! platforms and round-trip bit for bit.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::network::topology::Topology;

/// Sentinel float at the start of every file.
pub const MAGIC: f32 = 9.0;
/// Final byte of every file.
pub const TERMINATOR: u8 = 0xFF;

const MAX_LAYERS: usize = u8::MAX as usize;
const MAX_LAYER_SIZE: usize = u16::MAX as usize;

/// Fails with `Format` if the header fields cannot hold `topology`.
fn check_header(topology: &Topology) -> Result<()> {
    if topology.layer_count() > MAX_LAYERS {
        return Err(Error::Format(format!(
            "{} layers exceed the 1-byte layer count (max {MAX_LAYERS})",
            topology.layer_count()
        )));
    }
    if let Some((i, size)) = topology
        .sizes()
        .iter()
        .enumerate()
        .find(|&(_, &s)| s > MAX_LAYER_SIZE)
    {
        return Err(Error::Format(format!(
            "layer {i} has size {size}, above the 2-byte limit {MAX_LAYER_SIZE}"
        )));
    }
    Ok(())
}

/// Writes `network` to `path`. The header is validated before any file is
/// created. Bytes go to a `.tmp` sibling that is renamed over `path` once
/// complete, so a failed save never leaves a partial file behind.
pub fn save<P: AsRef<Path>>(network: &Network, path: P) -> Result<()> {
    let path = path.as_ref();
    check_header(network.topology())?;

    write_atomically(path, |w| write_to(network, w))?;

    info!("saved network {:?} to {}", network.topology().sizes(), path.display());
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomically<F>(path: &Path, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = tmp_path(path);
    let result = File::create(&tmp).map_err(Error::from).and_then(|file| {
        let mut writer = BufWriter::new(file);
        body(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    });
    match result.and_then(|()| std::fs::rename(&tmp, path).map_err(Error::from)) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!("save to {} failed: {e}", path.display());
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

pub fn write_to<W: Write>(network: &Network, mut w: W) -> Result<()> {
    let topology = network.topology();
    check_header(topology)?;

    w.write_all(&MAGIC.to_le_bytes())?;
    w.write_all(&[topology.layer_count() as u8])?;
    for &size in topology.sizes() {
        w.write_all(&(size as u16).to_le_bytes())?;
    }

    for layer in network.layers() {
        write_f32s(&mut w, layer.biases())?;
        write_f32s(&mut w, layer.weights().as_slice())?;
    }

    w.write_all(&[TERMINATOR])?;
    Ok(())
}

fn write_f32s<W: Write>(w: &mut W, values: &[f32]) -> Result<()> {
    for v in values {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

/// Reads a network written by [`save`]. Activations come back as the
/// default; they are not part of the file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
    let path = path.as_ref();
    let network = read_from(BufReader::new(File::open(path)?))?;
    info!("loaded network {:?} from {}", network.topology().sizes(), path.display());
    Ok(network)
}

pub fn read_from<R: Read>(mut r: R) -> Result<Network> {
    let mut magic = [0u8; 4];
    read_exact(&mut r, &mut magic, "magic")?;
    if magic != MAGIC.to_le_bytes() {
        return Err(Error::Format(format!(
            "bad magic {magic:02x?}, expected {:02x?}",
            MAGIC.to_le_bytes()
        )));
    }

    let mut count = [0u8; 1];
    read_exact(&mut r, &mut count, "layer count")?;
    let count = count[0] as usize;
    if count < 2 {
        return Err(Error::Format(format!("layer count {count} is below 2")));
    }

    let mut sizes = Vec::with_capacity(count);
    for _ in 0..count {
        let mut size = [0u8; 2];
        read_exact(&mut r, &mut size, "layer sizes")?;
        sizes.push(u16::from_le_bytes(size) as usize);
    }
    let topology = Topology::new(&sizes).map_err(|e| Error::Format(e.to_string()))?;
    debug!("file header: layer sizes {sizes:?}");

    // Payload is read before the network is allocated, so a header claiming
    // huge layers cannot reserve more memory than the stream actually holds.
    let mut params = Vec::with_capacity(count - 1);
    for pair in sizes.windows(2) {
        let biases = read_f32s(&mut r, pair[1], "biases")?;
        let weights = read_f32s(&mut r, pair[0] * pair[1], "weights")?;
        params.push((biases, weights));
    }

    let mut end = [0u8; 1];
    read_exact(&mut r, &mut end, "terminator")?;
    if end[0] != TERMINATOR {
        return Err(Error::Format(format!(
            "expected terminator {TERMINATOR:#04x}, found {:#04x}",
            end[0]
        )));
    }

    let mut network = Network::new(topology)?;
    for (layer, (biases, weights)) in network.layers_mut().iter_mut().zip(params) {
        layer.biases_mut().copy_from_slice(&biases);
        layer.weights_mut().copy_from_slice(&weights);
    }
    Ok(network)
}

/// `read_exact` that reports a short stream as a `Format` error.
fn read_exact<R: Read>(r: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => Error::Format(format!("file truncated in {what}")),
        _ => Error::Io(e),
    })
}

/// Reads `count` floats. The buffer grows with the bytes actually read
/// rather than being sized from `count` up front.
fn read_f32s<R: Read>(r: &mut R, count: usize, what: &str) -> Result<Vec<f32>> {
    let len = count as u64 * 4;
    let mut bytes = Vec::new();
    r.by_ref().take(len).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != len {
        return Err(Error::Format(format!("file truncated in {what}")));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

impl Network {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save(self, path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Network> {
        load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_network() -> Network {
        let mut net = Network::from_sizes(&[3, 2, 1]).unwrap();
        net.initialize_seeded(11);
        net.layer_mut(1).unwrap().biases_mut().copy_from_slice(&[0.25, -1.5]);
        net
    }

    #[test]
    fn header_layout() {
        let net = small_network();
        let mut bytes = Vec::new();
        write_to(&net, &mut bytes).unwrap();

        assert_eq!(&bytes[..4], &9.0f32.to_le_bytes());
        assert_eq!(bytes[4], 3);
        assert_eq!(&bytes[5..11], &[3, 0, 2, 0, 1, 0]);
        // biases of layer 1 come first
        assert_eq!(&bytes[11..15], &0.25f32.to_le_bytes());
        let params = 2 + 6 + 1 + 2;
        assert_eq!(bytes.len(), 11 + 4 * params + 1);
        assert_eq!(bytes.last(), Some(&TERMINATOR));
    }

    #[test]
    fn round_trips_in_memory() {
        let net = small_network();
        let mut bytes = Vec::new();
        write_to(&net, &mut bytes).unwrap();
        let back = read_from(&bytes[..]).unwrap();

        assert_eq!(back.topology(), net.topology());
        for (a, b) in net.layers().iter().zip(back.layers()) {
            assert_eq!(a.weights(), b.weights());
            assert_eq!(a.biases(), b.biases());
        }
    }

    #[test]
    fn bad_magic_is_a_format_error() {
        let mut bytes = Vec::new();
        write_to(&small_network(), &mut bytes).unwrap();
        bytes[0] ^= 0x01;
        assert!(matches!(read_from(&bytes[..]), Err(Error::Format(_))));
    }

    #[test]
    fn truncated_stream_is_a_format_error() {
        let mut bytes = Vec::new();
        write_to(&small_network(), &mut bytes).unwrap();
        for cut in [2, 5, 9, 20, bytes.len() - 1] {
            assert!(
                matches!(read_from(&bytes[..cut]), Err(Error::Format(_))),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn degenerate_headers_are_rejected() {
        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[1, 4, 0]);
        assert!(matches!(read_from(&bytes[..]), Err(Error::Format(_))));

        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[2, 0, 0, 1, 0]);
        assert!(matches!(read_from(&bytes[..]), Err(Error::Format(_))));
    }

    #[test]
    fn huge_header_with_no_payload_is_a_format_error() {
        // 65535 x 65535 weights claimed, nothing behind the header
        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[2, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(bytes.len(), 9);
        assert!(matches!(read_from(&bytes[..]), Err(Error::Format(_))));

        let mut bytes = MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[2, 0xFF, 0xFF, 0x00, 0x10]);
        bytes.extend_from_slice(&[0u8; 64]);
        assert!(matches!(read_from(&bytes[..]), Err(Error::Format(_))));
    }

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.bin");
        let result = write_atomically(&path, |w| {
            w.write_all(&MAGIC.to_le_bytes())?;
            Err(Error::Format("stopped halfway".to_string()))
        });

        assert!(matches!(result, Err(Error::Format(_))));
        assert!(!path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.bin");
        save(&small_network(), &path).unwrap();
        let before = std::fs::read(&path).unwrap();

        let result = write_atomically(&path, |w| {
            w.write_all(&[0u8; 3])?;
            Err(Error::Format("stopped halfway".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn successful_save_leaves_no_tmp_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.bin");
        save(&small_network(), &path).unwrap();
        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn oversized_layer_cannot_be_written() {
        let net = Network::from_sizes(&[65536, 1]).unwrap();
        let mut bytes = Vec::new();
        assert!(matches!(write_to(&net, &mut bytes), Err(Error::Format(_))));
        assert!(bytes.is_empty());
    }
}
