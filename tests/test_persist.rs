use danknn::persist::{self, binary::MAGIC};
use danknn::{Error, Network};
use proptest::prelude::*;

fn assert_bit_identical(a: &Network, b: &Network) {
    assert_eq!(a.topology(), b.topology());
    for (la, lb) in a.layers().iter().zip(b.layers()) {
        let bits = |s: &[f32]| s.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(la.weights().as_slice()), bits(lb.weights().as_slice()));
        assert_eq!(bits(la.biases()), bits(lb.biases()));
    }
}

#[test]
fn save_then_load_reproduces_every_bit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.dnn");

    let mut net = Network::from_sizes(&[5, 7, 3, 2]).unwrap();
    net.initialize_seeded(123);
    // values that only survive a bit-exact encoding
    net.layer_mut(2).unwrap().biases_mut()[0] = f32::MIN_POSITIVE / 2.0;
    net.layer_mut(3).unwrap().weights_mut()[1] = -0.0;

    net.save(&path).unwrap();
    let back = Network::load(&path).unwrap();
    assert_bit_identical(&net, &back);
}

#[test]
fn file_starts_with_magic_and_ends_with_terminator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.dnn");
    let net = Network::from_sizes(&[2, 1]).unwrap();
    persist::save(&net, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &MAGIC.to_le_bytes());
    assert_eq!(bytes.len(), 4 + 1 + 2 * 2 + 4 * (1 + 2) + 1);
    assert_eq!(*bytes.last().unwrap(), 0xFF);
}

#[test]
fn oversized_layer_is_refused_and_no_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.dnn");
    let net = Network::from_sizes(&[1, 65536]).unwrap();

    assert!(matches!(net.save(&path), Err(Error::Format(_))));
    assert!(!path.exists());
}

#[test]
fn too_many_layers_are_refused() {
    let mut bytes = Vec::new();
    let net = Network::from_sizes(&vec![1; 256]).unwrap();
    assert!(matches!(persist::write_to(&net, &mut bytes), Err(Error::Format(_))));
}

#[test]
fn unopenable_paths_are_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.dnn");
    assert!(matches!(Network::load(&missing), Err(Error::Io(_))));

    let net = Network::from_sizes(&[2, 1]).unwrap();
    let bad = dir.path().join("no_such_dir").join("net.dnn");
    assert!(matches!(net.save(&bad), Err(Error::Io(_))));
}

#[test]
fn foreign_file_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.dnn");
    std::fs::write(&path, b"not a network file").unwrap();
    assert!(matches!(Network::load(&path), Err(Error::Format(_))));
}

#[test]
fn nine_byte_file_claiming_huge_layers_is_a_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.dnn");
    let mut bytes = MAGIC.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[2, 0xFF, 0xFF, 0xFF, 0xFF]);
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(Network::load(&path), Err(Error::Format(_))));
}

fn topology_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..=12, 2..=5)
}

proptest! {
    #[test]
    fn round_trip_any_topology(sizes in topology_strategy(), seed in any::<u64>()) {
        let mut net = Network::from_sizes(&sizes).unwrap();
        net.initialize_seeded(seed);

        let mut bytes = Vec::new();
        persist::write_to(&net, &mut bytes).unwrap();
        let back = persist::read_from(&bytes[..]).unwrap();
        prop_assert_eq!(back.topology().sizes(), &sizes[..]);
        assert_bit_identical(&net, &back);
    }

    #[test]
    fn xavier_bounds_hold_for_any_topology(sizes in topology_strategy(), seed in any::<u64>()) {
        let mut net = Network::from_sizes(&sizes).unwrap();
        net.initialize_seeded(seed);
        for layer in net.layers() {
            let bound = 1.0 / (layer.input_size() as f32).sqrt();
            for &w in layer.weights().as_slice() {
                prop_assert!(w.abs() <= bound, "{} exceeds {}", w, bound);
            }
            prop_assert!(layer.biases().iter().all(|&b| b == 0.0));
        }
    }
}
