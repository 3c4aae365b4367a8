use mesh_halo::algs::communicator::CommTag;
use mesh_halo::config::DecompositionConfig;

#[test]
fn missing_fields_take_defaults() {
    let cfg: DecompositionConfig = serde_json::from_str(r#"{ "global_length": 300 }"#).unwrap();
    assert_eq!(cfg.global_length, 300);
    assert_eq!(cfg.halo_width, DecompositionConfig::default().halo_width);
    cfg.validate(3).unwrap();
}

#[test]
fn json_round_trip() {
    let cfg = DecompositionConfig {
        global_length: 64,
        halo_width: 3,
        base_tag: 0x0200,
    };
    let s = serde_json::to_string(&cfg).unwrap();
    let back: DecompositionConfig = serde_json::from_str(&s).unwrap();
    assert_eq!(back, cfg);
    assert_eq!(back.tags().to_next, CommTag::new(0x0201));
}

#[test]
fn negative_length_is_rejected_by_serde() {
    let res: Result<DecompositionConfig, _> = serde_json::from_str(r#"{ "global_length": -5 }"#);
    assert!(res.is_err());
}
