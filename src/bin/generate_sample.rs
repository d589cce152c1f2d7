use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use spidergram::bse;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Synthetic suites: (rock type, enrichment of the most incompatible
/// elements relative to primitive mantle, Nb-Ta anomaly factor).
const SUITES: [(&str, f64, f64); 3] = [
    ("MORB", 0.4, 1.0),
    ("OIB", 30.0, 1.0),
    ("arc basalt", 8.0, 0.3),
];

const SAMPLES_PER_SUITE: usize = 4;

/// All built-in reference elements ranked from most to least incompatible
/// during mantle melting; enrichment decays smoothly along this ranking so
/// the generated suites plot as coherent spider patterns.
const INCOMPATIBILITY: [&str; 37] = [
    "Cs", "Rb", "Ba", "Th", "U", "K", "Nb", "Ta", "La", "Ce", "Pb", "Pr", "Nd", "Sr", "Sm", "Zr",
    "Hf", "Eu", "Gd", "Tb", "Dy", "Ho", "Y", "Er", "Tm", "Yb", "Lu", "Ti", "Mn", "V", "Sc", "Cu",
    "Zn", "Ga", "Co", "Cr", "Ni",
];

fn main() {
    let mut rng = SimpleRng::new(42);

    // Generate concentrations for every element of the built-in reference
    // table, columns in its row order.
    let reference = bse();
    let elements: Vec<String> = reference.elements().map(|e| e.to_string()).collect();
    let n_elements = elements.len();

    let mut sample_ids: Vec<String> = Vec::new();
    let mut rock_types: Vec<String> = Vec::new();
    let mut concentrations: Vec<Vec<f64>> = vec![Vec::new(); n_elements];

    let mut sample_no = 0;
    for (rock_type, enrichment, nb_anomaly) in SUITES {
        for _ in 0..SAMPLES_PER_SUITE {
            sample_no += 1;
            sample_ids.push(format!("S{sample_no:02}"));
            rock_types.push(rock_type.to_string());

            // Smooth pattern: enriched at the incompatible end, converging
            // toward primitive mantle at the compatible end, with lognormal
            // scatter per element.
            for (i, el) in elements.iter().enumerate() {
                let rank = INCOMPATIBILITY
                    .iter()
                    .position(|c| c == el)
                    .unwrap_or(INCOMPATIBILITY.len() - 1);
                let position = rank as f64 / (INCOMPATIBILITY.len() - 1) as f64;
                let mut factor = enrichment.powf(1.0 - position);
                if el == "Nb" || el == "Ta" {
                    factor *= nb_anomaly;
                }
                let noise = rng.gauss(0.0, 0.15).exp();
                let value = reference.value(el).unwrap_or(1.0) * factor * noise;
                concentrations[i].push(value);
            }
        }
    }

    // Build the Arrow schema: metadata strings first, then one Float64
    // column per element.
    let mut fields = vec![
        Field::new("sample_id", DataType::Utf8, false),
        Field::new("rock_type", DataType::Utf8, false),
    ];
    for el in &elements {
        fields.push(Field::new(el, DataType::Float64, false));
    }
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(StringArray::from(
            sample_ids.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            rock_types.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
    ];
    for column in concentrations {
        arrays.push(Arc::new(Float64Array::from(column)));
    }

    let batch =
        RecordBatch::try_new(schema.clone(), arrays).expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_data.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} samples ({} elements each) to {output_path}",
        sample_ids.len(),
        n_elements
    );
}
