//! Archiving superseded provider features.
//!
//! Before a provider's current features are replaced, they are copied into
//! the archive layer stamped with the round in effect and the max advertised
//! download tier. The tier field exists only on the archive layer.

use log::info;

use crate::error::Result;
use crate::store::feature::{AttrValue, AttributeFilter, Selection};
use crate::store::{fields, FeatureStore};

/// Utah Speed Code for a max advertised download rate in Mb/s.
/// Returns None when the rate is unknown.
pub fn speed_code(down: Option<f64>) -> Option<&'static str> {
    let down = down?;
    let code = if down <= 0.2 {
        "1"
    } else if down < 0.768 {
        "2"
    } else if down < 1.5 {
        "3"
    } else if down < 3.0 {
        "4"
    } else if down < 6.0 {
        "5"
    } else if down < 10.0 {
        "6"
    } else if down < 25.0 {
        "7"
    } else if down < 50.0 {
        "8"
    } else if down < 100.0 {
        "9"
    } else if down < 1000.0 {
        "10"
    } else {
        "11"
    };
    Some(code)
}

/// Copy `provider`'s rows from `source_layer` into `archive_layer`, stamping
/// `DataRound` and `MaxDownloadTier` on each copy.
///
/// When `max_tier` is given it is stamped verbatim on every row; otherwise
/// the tier is derived per row from the `MaxDown` attribute through the
/// speed-code table, with unknown rates archived without a tier.
///
/// Returns the number of rows archived.
pub fn archive_provider(
    store: &mut dyn FeatureStore,
    provider: &str,
    provider_field: &str,
    source_layer: &str,
    archive_layer: &str,
    round: &str,
    max_tier: Option<&str>,
) -> Result<usize> {
    info!(
        "Copying {}'s current features from {} to archive layer {}",
        provider, source_layer, archive_layer
    );

    let filter = AttributeFilter::equals(provider_field, provider);
    let selection = store.select_by_attribute(source_layer, &filter)?;

    let round_stamp = (fields::DATA_ROUND.to_string(), AttrValue::from(round));

    let archived = match max_tier {
        Some(tier) => {
            let stamps = vec![
                round_stamp,
                (fields::MAX_DOWNLOAD_TIER.to_string(), AttrValue::from(tier)),
            ];
            store.copy_rows(source_layer, &selection, archive_layer, &stamps)?
        }
        None => {
            // Tier varies per row; copy one row at a time
            let mut archived = 0;
            for row in store.rows(source_layer, &selection)? {
                let down = row.attr(fields::MAX_DOWN).and_then(AttrValue::as_number);
                let tier = match speed_code(down) {
                    Some(code) => AttrValue::from(code),
                    None => AttrValue::Null,
                };
                let stamps = vec![
                    round_stamp.clone(),
                    (fields::MAX_DOWNLOAD_TIER.to_string(), tier),
                ];
                let single = Selection {
                    layer: source_layer.to_string(),
                    oids: vec![row.oid],
                };
                archived += store.copy_rows(source_layer, &single, archive_layer, &stamps)?;
            }
            archived
        }
    };

    info!(
        "{} features archived from {} to {}",
        archived, source_layer, archive_layer
    );
    Ok(archived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::feature::Feature;
    use crate::store::{FieldDef, Workspace};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(0.1, "1" ; "dial_up")]
    #[test_case(0.2, "1" ; "upper_edge_of_one")]
    #[test_case(0.5, "2" ; "sub_dsl")]
    #[test_case(0.768, "3" ; "dsl_lower_edge")]
    #[test_case(1.5, "4" ; "t1_lower_edge")]
    #[test_case(3.0, "5" ; "basic")]
    #[test_case(6.0, "6" ; "mid")]
    #[test_case(10.0, "7" ; "fast_dsl")]
    #[test_case(25.0, "8" ; "broadband_floor")]
    #[test_case(50.0, "9" ; "mid_cable")]
    #[test_case(100.0, "10" ; "fast_cable")]
    #[test_case(1000.0, "11" ; "gigabit")]
    #[test_case(2500.0, "11" ; "multi_gig")]
    fn test_speed_code(down: f64, expected: &str) {
        assert_eq!(speed_code(Some(down)), Some(expected));
    }

    #[test]
    fn test_speed_code_unknown_rate() {
        assert_eq!(speed_code(None), None);
    }

    fn archive_fixture() -> Workspace {
        let mut workspace = Workspace::new();
        workspace.create_layer(
            "current",
            vec![
                FieldDef::text(fields::PROVIDER_NAME, 100),
                FieldDef::double(fields::MAX_DOWN),
                FieldDef::text(fields::IDENTIFIER, 50),
            ],
        );
        workspace.create_layer(
            "archive",
            vec![
                FieldDef::text(fields::PROVIDER_NAME, 100),
                FieldDef::double(fields::MAX_DOWN),
                FieldDef::text(fields::IDENTIFIER, 50),
                FieldDef::text(fields::DATA_ROUND, 20),
                FieldDef::text(fields::MAX_DOWNLOAD_TIER, 20),
            ],
        );
        for down in [100.0, 25.0] {
            let mut feature = Feature::new(0);
            feature.set_attr(fields::PROVIDER_NAME, AttrValue::from("Acme"));
            feature.set_attr(fields::MAX_DOWN, AttrValue::Number(down));
            workspace.insert_feature("current", feature).unwrap();
        }
        let mut other = Feature::new(0);
        other.set_attr(fields::PROVIDER_NAME, AttrValue::from("Zayo"));
        other.set_attr(fields::MAX_DOWN, AttrValue::Number(1000.0));
        workspace.insert_feature("current", other).unwrap();
        workspace
    }

    #[test]
    fn test_archive_stamps_supplied_tier() {
        let mut workspace = archive_fixture();

        let archived = archive_provider(
            &mut workspace,
            "Acme",
            fields::PROVIDER_NAME,
            "current",
            "archive",
            "2024Q1",
            Some("100/20"),
        )
        .unwrap();
        assert_eq!(archived, 2);

        let archive = workspace.layer("archive").unwrap();
        assert_eq!(archive.features.len(), 2);
        for feature in &archive.features {
            assert_eq!(feature.attr_text(fields::DATA_ROUND), Some("2024Q1"));
            assert_eq!(feature.attr_text(fields::MAX_DOWNLOAD_TIER), Some("100/20"));
        }
        // Only Acme was archived; Zayo stays current-only
        assert_eq!(workspace.layer("current").unwrap().features.len(), 3);
    }

    #[test]
    fn test_archive_derives_tier_per_row() {
        let mut workspace = archive_fixture();

        archive_provider(
            &mut workspace,
            "Acme",
            fields::PROVIDER_NAME,
            "current",
            "archive",
            "2024Q1",
            None,
        )
        .unwrap();

        let tiers: Vec<Option<String>> = workspace
            .layer("archive")
            .unwrap()
            .features
            .iter()
            .map(|f| f.attr_text(fields::MAX_DOWNLOAD_TIER).map(str::to_string))
            .collect();
        // 100 Mb/s -> "10", 25 Mb/s -> "8"
        assert_eq!(tiers, vec![Some("10".to_string()), Some("8".to_string())]);
    }
}
