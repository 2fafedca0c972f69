use mobility_segments::export::{write_dataset_csv, DEMOGRAPHICS_FILE, MOBILITY_FILE};
use mobility_segments::generators::generate_dataset;
use mobility_segments::models::{MobilityRecord, SpendingRecord};
use mobility_segments::regions::default_region_codes;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn writes_three_tables_that_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let dataset = generate_dataset(&default_region_codes(), &mut rng).unwrap();

    let files = write_dataset_csv(&dataset, dir.path()).unwrap();
    assert_eq!(files.mobility, dir.path().join(MOBILITY_FILE));
    assert!(files.demographics.ends_with(DEMOGRAPHICS_FILE));

    let mut reader = csv::Reader::from_path(&files.mobility).unwrap();
    let mobility: Vec<MobilityRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(mobility.len(), dataset.mobility.len());
    assert_eq!(mobility[0].region_code, dataset.mobility[0].region_code);
    assert_eq!(mobility[0].total_trips, dataset.mobility[0].total_trips);

    let mut reader = csv::Reader::from_path(&files.spending).unwrap();
    let spending: Vec<SpendingRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(spending.len(), dataset.spending.len());
    assert_eq!(spending[0].category, dataset.spending[0].category);
}

#[test]
fn creates_missing_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("out").join("synthetic");
    let mut rng = StdRng::seed_from_u64(3);
    let dataset = generate_dataset(&default_region_codes()[..2], &mut rng).unwrap();

    let files = write_dataset_csv(&dataset, &nested).unwrap();
    assert!(files.spending.exists());

    let header = std::fs::read_to_string(&files.spending).unwrap();
    assert!(header.starts_with("region_code,category,spending_amount,spending_proportion"));
}
