use bazaar_codec::minicbor;
use bazaar_codec::value::Value;
use bazaar_crypto::hash::{Hash, Hasher};
use bazaar_crypto::key::secp256k1::{SecretKey, Signature};
use bazaar_mmr::Mmr;
use bazaar_primitives::{
    EthereumAddress, Op, Patch, PatchPath, SignedPatchSet, Timestamp, Uint256,
};
use bazaar_shop::{
    root_of_patches, sign_patch_set, signer_of_patch_set, verify_proof, verify_signed_patch_set,
    Error,
};

const FIXED_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe51296170827936ea5cce4b76994b0f";
const FIXED_ADDRESS: &str = "1a90d4744979058aa58a8f981542cce348a85fd5";
const PATCHES_ROOT: &str = "df78277ca104a9e5e12133abcd6016fa775d85503604d9953b8f73296fdb03d7";

fn fixed_key() -> SecretKey {
    let bytes: [u8; 32] = hex::decode(FIXED_KEY).unwrap().try_into().unwrap();
    SecretKey::try_from(bytes).unwrap()
}

fn fixed_address() -> EthereumAddress {
    FIXED_ADDRESS.parse().unwrap()
}

fn sample_patches() -> Vec<Patch> {
    vec![
        Patch {
            op: Op::Add,
            path: PatchPath::listing(1, vec![]),
            value: Value::UInt(1),
        },
        Patch {
            op: Op::Replace,
            path: PatchPath::manifest(vec!["PricingCurrency".into()]),
            value: Value::UInt(2),
        },
        Patch {
            op: Op::Remove,
            path: PatchPath::tag("sale", vec![]),
            value: Value::Null,
        },
    ]
}

fn sample_set() -> SignedPatchSet {
    sign_patch_set(
        &fixed_key(),
        1,
        Uint256::from(23),
        Timestamp::from_rfc3339("2023-01-15T12:00:00Z").unwrap(),
        sample_patches(),
    )
    .unwrap()
}

#[test]
fn three_patches_pad_to_four_leaves() {
    let root = root_of_patches(&sample_patches()).unwrap();
    assert_eq!(root.to_string(), PATCHES_ROOT);

    // the same construction by hand: three patch leaves, one zero leaf, and
    // the root sits right before the position returned by the last append
    let mut mmr = Mmr::new();
    for patch in sample_patches() {
        mmr.push_leaf(Hasher::<256>::hash_cbor(&patch));
    }
    let last = mmr.push_leaf(Hasher::<256>::hash(b""));

    assert_eq!(last, 7);
    assert_eq!(mmr.node(last - 1).unwrap(), root);
}

#[test]
fn single_patch_needs_no_padding() {
    let patches = &sample_patches()[..1];
    let root = root_of_patches(patches).unwrap();

    assert_eq!(root, Hasher::<256>::hash_cbor(&patches[0]));
}

#[test]
fn empty_patch_list_is_rejected() {
    assert!(matches!(root_of_patches(&[]), Err(Error::EmptyPatchSet)));
}

#[test]
fn known_signature_bytes() {
    let set = sample_set();

    assert_eq!(set.header.root_hash.to_string(), PATCHES_ROOT);

    let header_bytes = minicbor::to_vec(set.header).unwrap();
    assert_eq!(
        hex::encode(&header_bytes),
        "a46653686f7049441768526f6f74486173685820df78277ca104a9e5e12133abcd6016fa775d85503604d9953b8f73296fdb03d76954696d657374616d70c074323032332d30312d31355431323a30303a30305a6c4b6579436172644e6f6e636501"
    );

    assert_eq!(
        set.signature.to_string(),
        "c66deec16247521555a7aad357205f22f5917ab97e38fa76ecacee79a262a77a2df792983f984b6fcc8fa11ff395a9bb1618657e99a5ce405b1f49ab4d4a8fd71c"
    );
}

#[test]
fn signer_roundtrip() {
    let set = sample_set();

    let signer = signer_of_patch_set(&set).unwrap();
    assert_eq!(signer, fixed_address());

    verify_signed_patch_set(&set, &fixed_address()).unwrap();
}

#[test]
fn wrong_signer_is_unauthorized() {
    let set = sample_set();
    let other = EthereumAddress::new([0x99; 20]);

    assert!(matches!(
        verify_signed_patch_set(&set, &other),
        Err(Error::UnauthorizedSigner { .. })
    ));
}

#[test]
fn tampered_root_is_detected() {
    let mut set = sample_set();
    set.header.root_hash = Hash::new([0x42; 32]);

    assert!(matches!(
        signer_of_patch_set(&set),
        Err(Error::RootMismatch { .. })
    ));
}

#[test]
fn tampered_patches_are_detected() {
    let mut set = sample_set();
    set.patches.pop();

    assert!(matches!(
        signer_of_patch_set(&set),
        Err(Error::RootMismatch { .. })
    ));
}

#[test]
fn garbled_signature_does_not_verify() {
    let mut set = sample_set();
    let mut bytes: [u8; 65] = set.signature.as_ref().try_into().unwrap();
    bytes[10] ^= 0xff;
    set.signature = Signature::from(bytes);

    // recovery yields some other key, so the signer check must fail
    match verify_signed_patch_set(&set, &fixed_address()) {
        Err(Error::UnauthorizedSigner { .. }) | Err(Error::Signature(_)) => {}
        other => panic!("expected a signature failure, got {other:?}"),
    }
}

#[test]
fn proof_verification_diagnostics() {
    let mut mmr = Mmr::new();
    let leaves: Vec<Hash<32>> = (0u64..4)
        .map(|e| Hasher::<256>::hash(&e.to_be_bytes()))
        .collect();
    for leaf in &leaves {
        mmr.push_leaf(*leaf);
    }

    let root = mmr.root().unwrap();
    let path = mmr.inclusion_proof(0, 7).unwrap();

    verify_proof(0, &leaves[0], &path, &root).unwrap();

    assert!(matches!(
        verify_proof(0, &leaves[1], &path, &root),
        Err(Error::RootMismatch { .. })
    ));

    let mut extended = path.clone();
    extended.push(Hash::new([0x07; 32]));
    assert!(matches!(
        verify_proof(0, &leaves[0], &extended, &root),
        Err(Error::RootMismatch { .. })
    ));
}
