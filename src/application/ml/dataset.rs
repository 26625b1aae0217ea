//! Loading and cleaning the historical listings used for training.

use crate::domain::errors::PipelineError;
use crate::domain::features::FeatureRecord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use statrs::statistics::{Data, Median};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Fixed conversion rate applied to the source prices (1 INR = 0.10 MAD)
pub const INR_TO_MAD: f64 = 0.10;

/// Year that `age` is computed against at training time
pub const DEFAULT_REFERENCE_YEAR: i64 = 2025;

const TARGET_COLUMN: &str = "selling_price";

const CATEGORICAL_COLUMNS: &[&str] = &["company", "model", "fuel", "seller_type", "transmission"];

/// Numeric columns that are coerced and median-filled
const NUMERIC_COLUMNS: &[&str] = &[
    "year",
    "km_driven",
    "mileage_mpg",
    "engine_cc",
    "max_power_bhp",
    "seats",
];

/// One cleaned listing with its price in MAD
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub features: FeatureRecord,
    pub price_mad: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PreprocessOptions {
    pub reference_year: i64,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            reference_year: DEFAULT_REFERENCE_YEAR,
        }
    }
}

pub fn load_csv(
    path: &Path,
    options: PreprocessOptions,
) -> Result<Vec<LabeledRecord>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loading training data from {:?}", path);
    from_reader(BufReader::new(file), options)
}

/// Reads and cleans a listings CSV.
///
/// Exact duplicate rows are dropped, unparsable numeric cells are replaced by
/// the column median, rows whose price cannot be parsed are skipped with a
/// warning. Columns other than the model inputs, `year` and `selling_price`
/// (such as `torque_nm`) are neither required nor read.
pub fn from_reader<R: Read>(
    reader: R,
    options: PreprocessOptions,
) -> Result<Vec<LabeledRecord>, PipelineError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Csv(e.to_string()))?
        .clone();

    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim(), i))
        .collect();
    let column = |name: &str| {
        index
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    };

    let target_idx = column(TARGET_COLUMN)?;
    let categorical_idx = CATEGORICAL_COLUMNS
        .iter()
        .map(|&c| column(c))
        .collect::<Result<Vec<_>, _>>()?;
    let numeric_idx = NUMERIC_COLUMNS
        .iter()
        .map(|&c| column(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut duplicates = 0usize;
    let mut bad_target = 0usize;

    let mut categorical: Vec<[String; 5]> = Vec::new();
    let mut numeric: Vec<Vec<f64>> = Vec::new();
    let mut targets: Vec<f64> = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| PipelineError::Csv(e.to_string()))?;

        let fields: Vec<String> = record.iter().map(str::to_owned).collect();
        if !seen.insert(fields) {
            duplicates += 1;
            continue;
        }

        let Some(price) = parse_number(record.get(target_idx)) else {
            bad_target += 1;
            continue;
        };

        categorical.push(std::array::from_fn(|k| {
            record.get(categorical_idx[k]).unwrap_or("").trim().to_string()
        }));
        numeric.push(
            numeric_idx
                .iter()
                .map(|&i| parse_number(record.get(i)).unwrap_or(f64::NAN))
                .collect(),
        );
        targets.push(price * INR_TO_MAD);
    }

    if duplicates > 0 {
        info!("Dropped {} duplicate rows", duplicates);
    }
    if bad_target > 0 {
        warn!("Skipped {} rows with an unparsable {}", bad_target, TARGET_COLUMN);
    }
    if targets.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    fill_with_median(&mut numeric);

    let rows = categorical
        .into_iter()
        .zip(numeric)
        .zip(targets)
        .map(|((cat, num), price_mad)| {
            let [company, model, fuel, seller_type, transmission] = cat;
            LabeledRecord {
                features: FeatureRecord {
                    company,
                    model,
                    fuel,
                    seller_type,
                    transmission,
                    km_driven: num[1],
                    mileage_mpg: num[2],
                    engine_cc: num[3],
                    max_power_bhp: num[4],
                    seats: num[5].round() as i64,
                    age: Some(options.reference_year - num[0].round() as i64),
                },
                price_mad,
            }
        })
        .collect::<Vec<_>>();

    info!("Loaded {} training rows", rows.len());
    Ok(rows)
}

fn parse_number(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|c| c.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Replaces NaN cells with the median of the column's parsed values (0 when
/// the whole column is unparsable).
fn fill_with_median(rows: &mut [Vec<f64>]) {
    let Some(width) = rows.first().map(Vec::len) else {
        return;
    };

    for col in 0..width {
        let present: Vec<f64> = rows
            .iter()
            .map(|r| r[col])
            .filter(|v| !v.is_nan())
            .collect();
        if present.len() == rows.len() {
            continue;
        }
        let median = if present.is_empty() {
            0.0
        } else {
            Data::new(present).median()
        };
        for row in rows.iter_mut() {
            if row[col].is_nan() {
                row[col] = median;
            }
        }
    }
}

/// Shuffles with a fixed seed and holds out `test_fraction` of the rows.
///
/// The held-out count is rounded up, but at least one row always stays in
/// the training side.
pub fn train_test_split(
    mut rows: Vec<LabeledRecord>,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<LabeledRecord>, Vec<LabeledRecord>), PipelineError> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(PipelineError::InvalidParameter(format!(
            "test fraction must be in [0, 1), got {}",
            test_fraction
        )));
    }
    if rows.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    let n_test = ((rows.len() as f64 * test_fraction).ceil() as usize).min(rows.len() - 1);
    let test = rows.split_off(rows.len() - n_test);
    Ok((rows, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "company,model,year,fuel,seller_type,transmission,\
                          km_driven,mileage_mpg,engine_cc,max_power_bhp,torque_nm,\
                          seats,selling_price\n";

    fn csv_text(rows: &[&str]) -> String {
        let mut s = HEADER.to_string();
        for row in rows {
            s.push_str(row);
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_rows_are_converted_to_mad_and_aged() {
        let data = csv_text(&[
            "Maruti,Swift,2015,Petrol,Individual,Manual,50000,45.0,1200,80,110,5,450000",
        ]);
        let rows = from_reader(data.as_bytes(), PreprocessOptions::default()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!((row.price_mad - 45000.0).abs() < 1e-6);
        assert_eq!(row.features.age, Some(10));
        assert_eq!(row.features.seats, 5);
        assert_eq!(row.features.company, "Maruti");
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let line = "Maruti,Swift,2015,Petrol,Individual,Manual,50000,45.0,1200,80,110,5,450000";
        let other = "Hyundai,i20,2018,Diesel,Dealer,Manual,30000,50.0,1400,90,200,5,650000";
        let data = csv_text(&[line, line, other]);
        let rows = from_reader(data.as_bytes(), PreprocessOptions::default()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_unparsable_numbers_take_column_median() {
        let data = csv_text(&[
            "A,a,2015,Petrol,Individual,Manual,10000,40.0,1000,70,100,5,100000",
            "B,b,2016,Petrol,Individual,Manual,20000,n/a,1200,80,100,5,200000",
            "C,c,2017,Petrol,Individual,Manual,30000,50.0,1400,90,100,5,300000",
        ]);
        let rows = from_reader(data.as_bytes(), PreprocessOptions::default()).unwrap();
        assert_eq!(rows[1].features.mileage_mpg, 45.0);
    }

    #[test]
    fn test_rows_without_price_are_skipped() {
        let data = csv_text(&[
            "A,a,2015,Petrol,Individual,Manual,10000,40.0,1000,70,100,5,",
            "B,b,2016,Petrol,Individual,Manual,20000,45.0,1200,80,100,5,200000",
        ]);
        let rows = from_reader(data.as_bytes(), PreprocessOptions::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].features.company, "B");
    }

    #[test]
    fn test_torque_column_is_optional() {
        let data = "company,model,year,fuel,seller_type,transmission,km_driven,\
                    mileage_mpg,engine_cc,max_power_bhp,seats,selling_price\n\
                    Maruti,Swift,2015,Petrol,Individual,Manual,50000,45.0,1200,80,5,450000\n";
        let rows = from_reader(data.as_bytes(), PreprocessOptions::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].features.max_power_bhp, 80.0);
    }

    #[test]
    fn test_unparsable_price_skips_row_instead_of_failing() {
        let data = csv_text(&[
            "A,a,2015,Petrol,Individual,Manual,10000,40.0,1000,70,100,5,call for price",
            "B,b,2016,Petrol,Individual,Manual,20000,45.0,1200,80,100,5,200000",
        ]);
        let rows = from_reader(data.as_bytes(), PreprocessOptions::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!((rows[0].price_mad - 20000.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let data = "company,model,year\nMaruti,Swift,2015\n";
        let err = from_reader(data.as_bytes(), PreprocessOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "selling_price"));
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let err = from_reader(HEADER.as_bytes(), PreprocessOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset));
    }

    fn labeled(n: usize) -> Vec<LabeledRecord> {
        let data: Vec<String> = (0..n)
            .map(|i| {
                format!(
                    "C{i},m,2015,Petrol,Individual,Manual,{},40,1000,70,100,5,{}",
                    1000 * i,
                    100000 + i
                )
            })
            .collect();
        let refs: Vec<&str> = data.iter().map(String::as_str).collect();
        from_reader(csv_text(&refs).as_bytes(), PreprocessOptions::default())
            .expect("generated rows parse")
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let (train, test) = train_test_split(labeled(10), 0.3, 42).unwrap();
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);

        let (train_again, _) = train_test_split(labeled(10), 0.3, 42).unwrap();
        assert_eq!(train, train_again);
    }

    #[test]
    fn test_split_keeps_a_training_row() {
        let (train, test) = train_test_split(labeled(1), 0.5, 7).unwrap();
        assert_eq!(train.len(), 1);
        assert!(test.is_empty());
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        assert!(train_test_split(labeled(3), 1.0, 42).is_err());
    }
}
