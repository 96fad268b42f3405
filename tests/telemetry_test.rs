use cfpilot::telemetry::{
    round_2dp, LatestValues, LogConfig, TelemetryFrame, VarType, LOG_BLOCK_MAX_BYTES,
};
use cfpilot::Error;

fn floats(n: usize) -> LogConfig {
    let mut config = LogConfig::new("Floats", 100);
    for i in 0..n {
        config.add_variable(format!("group.var{}", i), VarType::Float);
    }
    config
}

#[test]
fn block_payload_is_limited() {
    assert!(floats(6).validate().is_ok());
    assert!(matches!(floats(7).validate(), Err(Error::InvalidLogConfig(_))));

    let mut full = floats(6);
    full.add_variable("group.small", VarType::Uint16);
    assert_eq!(full.payload_size(), LOG_BLOCK_MAX_BYTES);
    assert!(full.validate().is_ok());

    full.add_variable("group.byte", VarType::Int8);
    assert!(full.validate().is_err());
}

#[test]
fn block_period_is_limited() {
    let mut config = floats(1);
    for period in [10, 40, 2550] {
        config.period_ms = period;
        assert!(config.validate().is_ok(), "{}ms should be accepted", period);
    }
    for period in [0, 9, 2551] {
        config.period_ms = period;
        assert!(config.validate().is_err(), "{}ms should be refused", period);
    }
}

#[test]
fn empty_and_duplicated_blocks_are_refused() {
    assert!(LogConfig::new("Empty", 100).validate().is_err());

    let mut config = LogConfig::new("Twice", 100);
    config
        .add_variable("stateEstimate.roll", VarType::Float)
        .add_variable("stateEstimate.roll", VarType::Float);
    assert!(config.validate().is_err());
}

#[test]
fn var_types_parse_from_c_names() {
    assert_eq!("float".parse::<VarType>().unwrap(), VarType::Float);
    assert_eq!("uint8_t".parse::<VarType>().unwrap(), VarType::Uint8);
    assert_eq!("FP16".parse::<VarType>().unwrap(), VarType::Fp16);
    assert_eq!(VarType::Fp16.byte_length(), 2);
    assert_eq!(VarType::Int32.to_string(), "int32_t");
    assert!("double".parse::<VarType>().is_err());
}

#[test]
fn rounding_keeps_two_decimals() {
    assert_eq!(round_2dp(1.23456), 1.23);
    assert_eq!(round_2dp(-7.891), -7.89);
    assert_eq!(round_2dp(0.125001), 0.13);
    assert_eq!(round_2dp(42.0), 42.0);
}

#[test]
fn rounding_ties_go_to_even() {
    assert_eq!(round_2dp(0.125), 0.12);
    assert_eq!(round_2dp(1.125), 1.12);
    assert_eq!(round_2dp(0.375), 0.38);
    assert_eq!(round_2dp(-2.5), -2.5);
    assert_eq!(round_2dp(-0.005), 0.0);
}

#[test]
fn frames_keep_block_order() {
    let frame = TelemetryFrame::new(
        1234,
        vec![
            ("stateEstimate.yaw".to_owned(), 12.346),
            ("stateEstimate.roll".to_owned(), -0.5),
        ],
    );

    assert_eq!(frame.values(), vec![12.346, -0.5]);
    assert_eq!(frame.rounded(), vec![12.35, -0.5]);
    assert_eq!(frame.get("stateEstimate.roll"), Some(-0.5));
    assert_eq!(frame.get("stateEstimate.pitch"), None);

    let names: Vec<&str> = frame.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["stateEstimate.yaw", "stateEstimate.roll"]);
}

#[test]
fn latest_values_are_shared_between_clones() {
    let latest = LatestValues::new();
    let reader = latest.clone();
    assert!(reader.is_empty());

    latest.store(vec![1.0, 2.0]);
    assert_eq!(reader.snapshot(), vec![1.0, 2.0]);

    latest.store(vec![3.0]);
    assert_eq!(reader.snapshot(), vec![3.0]);
}
