use super::*;

#[test]
fn only_auto_is_offered() {
    assert_eq!(crc_sources(), &["auto"]);
    assert_eq!(crc_sources().len(), 1);
}

#[test]
fn parse_maps_names_to_enabled() {
    assert!(parse_crc_source(Some("auto")).unwrap());
    assert!(!parse_crc_source(None).unwrap());

    let err = parse_crc_source(Some("plane1")).unwrap_err();
    assert!(matches!(err, VcrtcError::InvalidArgument(_)));
    assert!(err.to_string().contains("plane1"));
}

#[test]
fn verify_reports_one_value() {
    assert_eq!(verify_crc_source(Some("auto")).unwrap(), 1);
    assert_eq!(verify_crc_source(None).unwrap(), 1);
    assert!(verify_crc_source(Some("AUTO")).is_err());
}
