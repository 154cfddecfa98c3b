use criterion::{black_box, criterion_group, criterion_main, Criterion};
use foodmap::data::boundary::BoundaryFeature;
use foodmap::data::key::normalize_key;
use foodmap::data::similarity::gestalt_ratio;
use foodmap::data::{ClusterRecord, ClusterTable, Dataset, Indicators, JoinOptions};
use geo::MultiPolygon;

const NAMES: &[&str] = &[
    "KABUPATEN ACEH BESAR",
    "Kota Banda Aceh",
    "Kab. Deli Serdang",
    "Kota Sibolga",
    "Kabupaten Tapanuli Tengah",
    "Kota Padang Panjang",
    "Kabupaten Pesisir Selatan",
    "Kota Pekanbaru",
    "Kabupaten Indragiri Hilir",
    "Kota Jambi",
    "Kabupaten Muaro Jambi",
    "Kota Palembang",
    "Kabupaten Ogan Komering Ulu Timur",
    "Kota Bengkulu",
    "Kabupaten Lampung Selatan",
    "Kota Bandar Lampung",
];

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_key", |b| {
        b.iter(|| {
            for name in NAMES {
                black_box(normalize_key(black_box(name)));
            }
        })
    });
}

fn bench_gestalt(c: &mut Criterion) {
    c.bench_function("gestalt_ratio", |b| {
        b.iter(|| gestalt_ratio(black_box("OGAN KOMERING ULU TIMUR"), black_box("OGAN KOMERING ULU SELATAN")))
    });
}

fn bench_join(c: &mut Criterion) {
    // Boundary names spelled differently from the table so most go through the fuzzy path
    let features: Vec<BoundaryFeature> = (0..150)
        .map(|i| BoundaryFeature {
            province: format!("Province {}", i % 10),
            district: format!("{} {}", NAMES[i % NAMES.len()], i),
            shape: MultiPolygon::new(Vec::new()),
        })
        .collect();
    let records = (0..150)
        .map(|i| {
            let district = format!("{} {} KOTA", NAMES[i % NAMES.len()], i);
            ClusterRecord {
                key: normalize_key(&district),
                district,
                cluster: Some((i % 6) as u8),
                category: None,
                category_label: None,
                indicators: Indicators::default(),
            }
        })
        .collect();
    let table = ClusterTable {
        records,
        has_category_column: false,
    };

    c.bench_function("join_150_regions", |b| {
        b.iter(|| Dataset::from_parts(black_box(features.clone()), &table, JoinOptions::default()))
    });
}

criterion_group!(benches, bench_normalize, bench_gestalt, bench_join);
criterion_main!(benches);
