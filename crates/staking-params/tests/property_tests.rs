//! Property-based tests for staking-params
//!
//! Uses proptest to generate valid parameter sequences and checks the
//! validated set and the height lookup against them.

use proptest::prelude::*;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use staking_params::{
    last_fixed_staking_cap, Amount, GlobalParams, ParameterSet, RawParameterVersion,
};

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Per-version knobs used to derive a valid raw version
#[derive(Debug, Clone)]
struct VersionSeed {
    activation_gap: u64,
    height_cap: bool,
    cap_increment: u64,
    quorum: u64,
    unbonding_fee: u64,
    min_staking_amount: u64,
    max_staking_amount: u64,
    min_staking_time: u64,
    confirmation_depth: u64,
}

fn version_seed_strategy() -> impl Strategy<Value = VersionSeed> {
    (
        100u64..200,
        prop::bool::weighted(1.0 / 3.0),
        1u64..1_000_000_000,
        1u64..=10,
        100_000u64..200_000,
        1_000_000u64..2_000_000,
        100_000_000u64..200_000_000,
        10_000u64..20_000,
        2u64..12,
    )
        .prop_map(
            |(
                activation_gap,
                height_cap,
                cap_increment,
                quorum,
                unbonding_fee,
                min_staking_amount,
                max_staking_amount,
                min_staking_time,
                confirmation_depth,
            )| VersionSeed {
                activation_gap,
                height_cap,
                cap_increment,
                quorum,
                unbonding_fee,
                min_staking_amount,
                max_staking_amount,
                min_staking_time,
                confirmation_depth,
            },
        )
}

/// Generate between 1 and 40 versions
fn seeds_strategy() -> impl Strategy<Value = (u64, Vec<VersionSeed>)> {
    (0u64..1_000, prop::collection::vec(version_seed_strategy(), 1..40))
}

fn covenant_key(index: u8) -> String {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[index; 32]).unwrap();
    hex::encode(PublicKey::from_secret_key(&secp, &secret).serialize())
}

fn build_versions(base_version: u64, seeds: &[VersionSeed]) -> Vec<RawParameterVersion> {
    let mut versions: Vec<RawParameterVersion> = Vec::with_capacity(seeds.len());
    let mut last_fixed_cap = 0u64;

    for (i, seed) in seeds.iter().enumerate() {
        let activation_height = match versions.last() {
            Some(prev) => prev.activation_height + seed.activation_gap,
            None => 1,
        };

        // The first version always has a fixed cap
        let (staking_cap, cap_height) = if seed.height_cap && i > 0 {
            (0, activation_height + seed.activation_gap)
        } else {
            let floor = last_fixed_cap.max(seed.max_staking_amount);
            (floor + seed.cap_increment, 0)
        };
        if staking_cap != 0 {
            last_fixed_cap = staking_cap;
        }

        versions.push(RawParameterVersion {
            version: base_version + i as u64,
            activation_height,
            staking_cap,
            cap_height,
            tag: "01020304".to_string(),
            covenant_pks: (1..=seed.quorum as u8 + 1).map(covenant_key).collect(),
            covenant_quorum: seed.quorum,
            unbonding_time: 100 + seed.activation_gap,
            unbonding_fee: seed.unbonding_fee,
            max_staking_amount: seed.max_staking_amount,
            min_staking_amount: seed.min_staking_amount,
            max_staking_time: u64::from(u16::MAX),
            min_staking_time: seed.min_staking_time,
            confirmation_depth: seed.confirmation_depth,
        });
    }

    versions
}

// ============================================================================
// Validation Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: every valid sequence parses and keeps its values
    #[test]
    fn prop_valid_params_parse((base, seeds) in seeds_strategy()) {
        let raw = build_versions(base, &seeds);
        let parsed = ParameterSet::validate(&raw).expect("valid params");

        prop_assert_eq!(parsed.len(), raw.len());
        for (input, output) in raw.iter().zip(parsed.versions()) {
            prop_assert_eq!(input.version, output.version);
            prop_assert_eq!(input.activation_height, output.activation_height);
            prop_assert_eq!(input.staking_cap, output.staking_cap().to_sat());
            prop_assert_eq!(input.cap_height, output.cap_height());
            prop_assert_eq!(&input.tag, &hex::encode(output.tag));
            prop_assert_eq!(input.covenant_quorum, u64::from(output.covenant_quorum));
            prop_assert_eq!(input.unbonding_time, u64::from(output.unbonding_time));
            prop_assert_eq!(input.unbonding_fee, output.unbonding_fee.to_sat());
            prop_assert_eq!(input.max_staking_amount, output.max_staking_amount.to_sat());
            prop_assert_eq!(input.min_staking_amount, output.min_staking_amount.to_sat());
            prop_assert_eq!(input.max_staking_time, u64::from(output.max_staking_time));
            prop_assert_eq!(input.min_staking_time, u64::from(output.min_staking_time));
            prop_assert_eq!(input.confirmation_depth, u64::from(output.confirmation_depth));

            let keys: Vec<String> = output
                .covenant_pks
                .iter()
                .map(|pk| hex::encode(pk.serialize()))
                .collect();
            prop_assert_eq!(&input.covenant_pks, &keys);
        }
    }

    /// Property: versions step by one and activation heights strictly increase
    #[test]
    fn prop_versions_ordered((base, seeds) in seeds_strategy()) {
        let parsed = ParameterSet::validate(&build_versions(base, &seeds)).unwrap();

        for pair in parsed.versions().windows(2) {
            prop_assert_eq!(pair[1].version, pair[0].version + 1);
            prop_assert!(pair[1].activation_height > pair[0].activation_height);
        }
    }

    /// Property: exactly one cap is set and fixed caps never decrease
    #[test]
    fn prop_caps_exclusive_and_monotonic((base, seeds) in seeds_strategy()) {
        let parsed = ParameterSet::validate(&build_versions(base, &seeds)).unwrap();
        let versions = parsed.versions();

        for (i, v) in versions.iter().enumerate() {
            prop_assert!((v.staking_cap() == Amount::ZERO) != (v.cap_height() == 0));
            if let (Some(cap), Some(last)) =
                (v.cap.fixed_amount(), last_fixed_staking_cap(&versions[..i]))
            {
                prop_assert!(cap >= last);
            }
            if let Some(cap) = v.cap.fixed_amount() {
                prop_assert!(cap >= v.max_staking_amount);
            }
        }
    }

    /// Property: the JSON form round-trips through from_bytes
    #[test]
    fn prop_from_bytes_matches_validate((base, seeds) in seeds_strategy()) {
        let raw = build_versions(base, &seeds);
        let data = serde_json::to_vec(&GlobalParams { versions: raw.clone() }).unwrap();

        let from_bytes = ParameterSet::from_bytes(&data).unwrap();
        let validated = ParameterSet::validate(&raw).unwrap();
        prop_assert_eq!(from_bytes, validated);
    }

    /// Property: a fixed cap below the running floor is rejected
    #[test]
    fn prop_decreased_cap_rejected(
        (base, seeds) in seeds_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(seeds.len() > 1);
        let mut raw = build_versions(base, &seeds);
        let parsed = ParameterSet::validate(&raw).unwrap();

        let target = 1 + pick.index(raw.len() - 1);
        let floor = last_fixed_staking_cap(&parsed.versions()[..target])
            .expect("first version has a fixed cap");
        prop_assume!(floor.to_sat() - 1 >= raw[target].max_staking_amount);

        raw[target].cap_height = 0;
        raw[target].staking_cap = floor.to_sat() - 1;

        let err = ParameterSet::validate(&raw).unwrap_err();
        prop_assert!(err
            .to_string()
            .contains("staking cap cannot be decreased in later versions"));
    }
}

// ============================================================================
// Lookup Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: each version is returned at its activation height, and the
    /// previous version one block earlier
    #[test]
    fn prop_lookup_by_activation_height(
        (base, seeds) in seeds_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let parsed = ParameterSet::validate(&build_versions(base, &seeds)).unwrap();
        let index = pick.index(parsed.len());
        let chosen = &parsed.versions()[index];

        prop_assert_eq!(parsed.active_version_at(chosen.activation_height), Some(chosen));

        let before = parsed.active_version_at(chosen.activation_height - 1);
        if index > 0 {
            prop_assert_eq!(before, Some(&parsed.versions()[index - 1]));
        } else {
            prop_assert!(before.is_none());
        }
    }

    /// Property: any height maps to the last version activated at or below it
    #[test]
    fn prop_lookup_matches_linear_scan(
        (base, seeds) in seeds_strategy(),
        height in 0u64..10_000,
    ) {
        let parsed = ParameterSet::validate(&build_versions(base, &seeds)).unwrap();
        let expected = parsed
            .versions()
            .iter()
            .filter(|v| v.activation_height <= height)
            .last();

        prop_assert_eq!(parsed.active_version_at(height), expected);
        if height < parsed.first().activation_height {
            prop_assert!(parsed.active_version_at(height).is_none());
        }
    }
}

#[test]
fn test_amount_from_generated_cap() {
    let seeds = vec![
        VersionSeed {
            activation_gap: 100,
            height_cap: false,
            cap_increment: 5,
            quorum: 1,
            unbonding_fee: 100_000,
            min_staking_amount: 1_000_000,
            max_staking_amount: 100_000_000,
            min_staking_time: 10_000,
            confirmation_depth: 2,
        };
        2
    ];
    let parsed = ParameterSet::validate(&build_versions(0, &seeds)).unwrap();
    assert_eq!(parsed.first().staking_cap(), Amount::from_sat(100_000_005));
    assert_eq!(parsed.latest().staking_cap(), Amount::from_sat(100_000_010));
}
