//! Shared fixtures for the integration tests.

use tabular_logreg::data::loader::read_csv;
use tabular_logreg::data::model::DataTable;

pub const TARGET: &str = "Hogwarts House";

pub fn features() -> Vec<String> {
    vec!["Astronomy".to_string(), "Herbology".to_string()]
}

/// Cluster centers at the corners of a triangle, one per house.
const CENTERS: [(&str, f64, f64); 3] = [
    ("Gryffindor", 0.0, 60.0),
    ("Slytherin", -60.0, -40.0),
    ("Ravenclaw", 60.0, -40.0),
];

/// CSV text with `per_class` rows per house on a small grid around its center.
/// Rows are interleaved so every prefix contains all houses.
pub fn cluster_csv(per_class: usize, labelled: bool) -> String {
    let mut out = format!("Index,{TARGET},Best Hand,Astronomy,Herbology\n");
    let mut index = 0;
    for i in 0..per_class {
        let dx = (i % 5) as f64 * 2.0 - 4.0;
        let dy = (i / 5 % 5) as f64 * 2.0 - 4.0;
        for (house, cx, cy) in CENTERS {
            let hand = if i % 2 == 0 { "Left" } else { "Right" };
            let house = if labelled { house } else { "" };
            out.push_str(&format!("{index},{house},{hand},{},{}\n", cx + dx, cy + dy));
            index += 1;
        }
    }
    out
}

pub fn table_from_csv(text: &str) -> DataTable {
    read_csv(csv::Reader::from_reader(text.as_bytes())).expect("fixture CSV parses")
}

pub fn training_table() -> DataTable {
    table_from_csv(&cluster_csv(25, true))
}

/// House of each row of [`cluster_csv`], in row order.
pub fn expected_houses(per_class: usize) -> Vec<String> {
    (0..per_class)
        .flat_map(|_| CENTERS.iter().map(|(house, _, _)| house.to_string()))
        .collect()
}
