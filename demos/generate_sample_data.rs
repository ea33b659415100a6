use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "insurance_demo.csv".to_string());

    println!("📊 Generating synthetic insurance data...");
    println!();

    let regions = ["northeast", "northwest", "southeast", "southwest"];
    let rows = 300;

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["age", "sex", "bmi", "children", "smoker", "region", "charges"])?;

    let mut smokers = 0;
    for _ in 0..rows {
        let age = 18 + (rand::random::<f64>() * 47.0) as u32;
        let sex = if rand::random::<f64>() < 0.5 {
            "female"
        } else {
            "male"
        };
        // Sum of uniforms approximates a bell curve around 30
        let bmi = 18.0 + 8.0 * (rand::random::<f64>() + rand::random::<f64>() + rand::random::<f64>()) / 1.5;
        let children = (rand::random::<f64>() * 5.0) as u32;
        let smoker = rand::random::<f64>() < 0.2;
        let region = regions[(rand::random::<f64>() * regions.len() as f64) as usize % regions.len()];

        // Charges grow with age and bmi; smoking dominates
        let mut charges = 2000.0 + age as f64 * 240.0 + (bmi - 25.0) * 130.0;
        if smoker {
            charges += 18000.0;
            smokers += 1;
        }
        charges += rand::random::<f64>() * 2500.0;

        writer.write_record([
            age.to_string(),
            sex.to_string(),
            format!("{:.2}", bmi),
            children.to_string(),
            if smoker { "yes" } else { "no" }.to_string(),
            region.to_string(),
            format!("{:.2}", charges),
        ])?;
    }
    writer.flush()?;

    println!("  ✓ {} rows written to {}", rows, path);
    println!("  ✓ {} smokers ({}%)", smokers, smokers * 100 / rows);
    println!();
    println!("✨ Demo data created successfully!");
    println!();
    println!("You can now:");
    println!("  • Render the report: cargo run --example dashboard_report -- {}", path);
    println!("  • Dump it as JSON:   cargo run --example dashboard_report -- {} --json", path);

    Ok(())
}

// Simple pseudo-random number generator
mod rand {
    use std::cell::Cell;
    use std::time::{SystemTime, UNIX_EPOCH};

    thread_local! {
        static SEED: Cell<u64> = Cell::new(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos() as u64
        );
    }

    pub fn random<T: FromRandom>() -> T {
        T::from_random()
    }

    pub trait FromRandom {
        fn from_random() -> Self;
    }

    impl FromRandom for f64 {
        fn from_random() -> Self {
            SEED.with(|seed| {
                let mut s = seed.get();
                s ^= s << 13;
                s ^= s >> 7;
                s ^= s << 17;
                seed.set(s);
                (s as f64) / (u64::MAX as f64)
            })
        }
    }
}
