// Integration tests for end-to-end pipeline workflows and cross-module consistency

#[cfg(test)]
mod integration_tests {
    use crate::aggregate::AggregateKind;
    use crate::charts::ColorSeries;
    use crate::correlation::spearman;
    use crate::dataset::InMemoryDatasetSource;
    use crate::pipeline::{DashboardPipeline, PipelineConfig, PipelineError};

    const EPSILON: f64 = 1e-9;

    fn assert_close(a: f64, b: f64, context: &str) {
        assert!(
            (a - b).abs() < EPSILON,
            "{}: {} vs {} differ by more than {}",
            context,
            a,
            b,
            EPSILON
        );
    }

    struct InsuranceRow {
        age: f64,
        sex: &'static str,
        bmi: f64,
        children: f64,
        smoker: &'static str,
        region: &'static str,
        charges: f64,
    }

    fn insurance_rows() -> Vec<InsuranceRow> {
        vec![
            InsuranceRow { age: 19.0, sex: "female", bmi: 27.9, children: 0.0, smoker: "yes", region: "southwest", charges: 16884.92 },
            InsuranceRow { age: 18.0, sex: "male", bmi: 33.77, children: 1.0, smoker: "no", region: "southeast", charges: 1725.55 },
            InsuranceRow { age: 28.0, sex: "male", bmi: 33.0, children: 3.0, smoker: "no", region: "southeast", charges: 4449.46 },
            InsuranceRow { age: 33.0, sex: "male", bmi: 22.7, children: 0.0, smoker: "no", region: "northwest", charges: 21984.47 },
            InsuranceRow { age: 32.0, sex: "male", bmi: 28.88, children: 0.0, smoker: "no", region: "northwest", charges: 3866.86 },
            InsuranceRow { age: 31.0, sex: "female", bmi: 25.74, children: 0.0, smoker: "no", region: "southeast", charges: 3756.62 },
            InsuranceRow { age: 46.0, sex: "female", bmi: 33.44, children: 1.0, smoker: "no", region: "southeast", charges: 8240.59 },
            InsuranceRow { age: 37.0, sex: "female", bmi: 27.74, children: 3.0, smoker: "no", region: "northwest", charges: 7281.51 },
            InsuranceRow { age: 60.0, sex: "female", bmi: 25.84, children: 0.0, smoker: "no", region: "northwest", charges: 28923.14 },
            InsuranceRow { age: 62.0, sex: "female", bmi: 26.29, children: 0.0, smoker: "yes", region: "southeast", charges: 27808.73 },
            InsuranceRow { age: 23.0, sex: "male", bmi: 34.4, children: 0.0, smoker: "no", region: "southwest", charges: 1826.84 },
            InsuranceRow { age: 56.0, sex: "female", bmi: 39.82, children: 0.0, smoker: "no", region: "northeast", charges: 11090.72 },
        ]
    }

    fn source_from(rows: &[InsuranceRow]) -> InMemoryDatasetSource {
        let mut source = InMemoryDatasetSource::new();
        source.push_numeric("age", rows.iter().map(|r| r.age).collect());
        source.push_categorical("sex", rows.iter().map(|r| r.sex).collect::<Vec<_>>());
        source.push_numeric("bmi", rows.iter().map(|r| r.bmi).collect());
        source.push_numeric("children", rows.iter().map(|r| r.children).collect());
        source.push_categorical("smoker", rows.iter().map(|r| r.smoker).collect::<Vec<_>>());
        source.push_categorical("region", rows.iter().map(|r| r.region).collect::<Vec<_>>());
        source.push_numeric("charges", rows.iter().map(|r| r.charges).collect());
        source
    }

    /// End-to-end: load -> encode -> correlate -> snapshot, with every
    /// product consistent with the others.
    #[test]
    fn test_pipeline_products_are_mutually_consistent() {
        let rows = insurance_rows();
        let pipeline =
            DashboardPipeline::from_source(PipelineConfig::default(), &source_from(&rows))
                .unwrap();
        let snapshot = pipeline.refresh().unwrap();

        // Scatter group colors are the raw labels, decodable through the map
        let codes = pipeline.encoded().numeric("smoker").unwrap();
        let encoding = pipeline.encodings().column("smoker").unwrap();
        match &snapshot.scatter_grouped.color {
            ColorSeries::Label(labels) => {
                for (label, &code) in labels.iter().zip(codes.iter()) {
                    assert_eq!(encoding.label_of(code as usize), Some(label.as_str()));
                }
            }
            other => panic!("expected label colors, got {:?}", other),
        }

        // Bar chart equals a hand-computed groupby mean over the raw rows
        for (label, value) in snapshot.bar.labels.iter().zip(snapshot.bar.values.iter()) {
            let group: Vec<f64> = rows
                .iter()
                .filter(|r| r.region == label)
                .map(|r| r.charges)
                .collect();
            let mean = group.iter().sum::<f64>() / group.len() as f64;
            assert_close(*value, mean, label);
        }

        // The heatmap cell for (bmi, charges) equals the pairwise coefficient
        let bmi: Vec<f64> = rows.iter().map(|r| r.bmi).collect();
        let charges: Vec<f64> = rows.iter().map(|r| r.charges).collect();
        let direct = spearman(&bmi, &charges).unwrap();
        let cell = pipeline.correlation().get("bmi", "charges").unwrap();
        assert_close(cell, direct, "bmi/charges");
    }

    /// Shuffling the input rows must not change any derived product.
    #[test]
    fn test_row_order_does_not_change_derived_products() {
        let rows = insurance_rows();
        let mut shuffled_rows = insurance_rows();
        shuffled_rows.reverse();
        shuffled_rows.swap(1, 7);
        shuffled_rows.swap(3, 9);

        let config = PipelineConfig::default();
        let first = DashboardPipeline::from_source(config.clone(), &source_from(&rows)).unwrap();
        let second =
            DashboardPipeline::from_source(config, &source_from(&shuffled_rows)).unwrap();

        assert_eq!(
            first.encodings(),
            second.encodings(),
            "encodings must not depend on row order"
        );

        assert_eq!(first.correlation().labels(), second.correlation().labels());
        for (row_a, row_b) in first
            .correlation()
            .values()
            .iter()
            .zip(second.correlation().values().iter())
        {
            for (a, b) in row_a.iter().zip(row_b.iter()) {
                assert_close(*a, *b, "correlation entry");
            }
        }

        let bar_first = first.refresh().unwrap().bar;
        let bar_second = second.refresh().unwrap().bar;
        assert_eq!(bar_first.labels, bar_second.labels);
        for (a, b) in bar_first.values.iter().zip(bar_second.values.iter()) {
            assert_close(*a, *b, "bar value");
        }
    }

    /// Stage errors surface through the pipeline with their stage intact.
    #[test]
    fn test_stage_errors_surface_through_pipeline() {
        let config = PipelineConfig::default();

        // Missing column
        let mut source = InMemoryDatasetSource::new();
        source.push_numeric("age", vec![19.0, 33.0]);
        let result = DashboardPipeline::from_source(config.clone(), &source);
        assert!(matches!(result, Err(PipelineError::Load(_))));

        // Constant numeric column
        let rows = insurance_rows();
        let mut source = source_from(&rows);
        source.clear();
        source.push_numeric("age", vec![40.0; rows.len()]);
        source.push_categorical("sex", rows.iter().map(|r| r.sex).collect::<Vec<_>>());
        source.push_numeric("bmi", rows.iter().map(|r| r.bmi).collect());
        source.push_numeric("children", rows.iter().map(|r| r.children).collect());
        source.push_categorical("smoker", rows.iter().map(|r| r.smoker).collect::<Vec<_>>());
        source.push_categorical("region", rows.iter().map(|r| r.region).collect::<Vec<_>>());
        source.push_numeric("charges", rows.iter().map(|r| r.charges).collect());
        let result = DashboardPipeline::from_source(config.clone(), &source);
        assert!(matches!(result, Err(PipelineError::Correlation(_))));

        // Aggregate request against an unknown column
        let pipeline =
            DashboardPipeline::from_source(config, &source_from(&rows)).unwrap();
        let result = pipeline.aggregate_view("state", "charges", AggregateKind::Mean);
        assert!(matches!(result, Err(PipelineError::Aggregate(_))));
    }

    /// A snapshot survives a JSON round trip unchanged.
    #[test]
    fn test_snapshot_json_roundtrip() {
        let pipeline = DashboardPipeline::from_source(
            PipelineConfig::default(),
            &source_from(&insurance_rows()),
        )
        .unwrap();
        let snapshot = pipeline.refresh().unwrap();

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: crate::pipeline::DashboardSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
