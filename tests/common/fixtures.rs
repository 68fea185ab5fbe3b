use chrono::{NaiveDate, NaiveDateTime};

use reckit_exporter::config::ConnectionDescriptor;
use reckit_exporter::record::ProductionRecord;

pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 10)
        .expect("date")
        .and_hms_opt(h, m, s)
        .expect("time")
}

pub fn descriptor() -> ConnectionDescriptor {
    ConnectionDescriptor::new("localhost", "5432", "postgres", "secret", "postgres_reckit")
        .expect("complete descriptor")
}

pub fn record(plant: &str, line: &str, output_1: i32, output_2: i32) -> ProductionRecord {
    ProductionRecord {
        date_time: at(14, 0, 0),
        plant_name: plant.to_string(),
        line_name: line.to_string(),
        output_1,
        output_2,
        total_output: output_1 + output_2,
    }
}

pub fn hourly_rows() -> Vec<ProductionRecord> {
    vec![
        record("Cikarang", "Line 1", 120, 80),
        record("Cikarang", "Mespack BH", 300, 10),
        record("Cikarang", "Line 2", 50, 45),
    ]
}
