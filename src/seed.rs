use dotenvy::dotenv;
use envconfig::Envconfig;
use medirec::{
    config::SeedConfig,
    db::init_db,
    services::{Pharmacy, ServiceError},
    Error,
};
use rand::{seq::SliceRandom, Rng};
use sqlx::SqlitePool;

struct SeedMedicine {
    id: i64,
    name: &'static str,
    uses: &'static str,
    stock: i64,
    price_cents: i64,
    therapeutic_class: &'static str,
    side_effects: &'static str,
}

const DEMO_USERS: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];
const DEMO_PURCHASES: usize = 25;

fn get_seed_data() -> Vec<SeedMedicine> {
    vec![
        SeedMedicine {
            id: 1,
            name: "Paracetamol 500mg",
            uses: "Pain relief",
            stock: 120,
            price_cents: 500,
            therapeutic_class: "Pain analgesics",
            side_effects: "Nausea",
        },
        SeedMedicine {
            id: 2,
            name: "Ibuprofen 400mg",
            uses: "Pain relief",
            stock: 80,
            price_cents: 850,
            therapeutic_class: "Pain analgesics",
            side_effects: "Heartburn, Dizziness",
        },
        SeedMedicine {
            id: 3,
            name: "Aspirin 75mg",
            uses: "Pain relief",
            stock: 0,
            price_cents: 300,
            therapeutic_class: "Blood related",
            side_effects: "Stomach upset",
        },
        SeedMedicine {
            id: 4,
            name: "Cetirizine 10mg",
            uses: "Allergy",
            stock: 60,
            price_cents: 350,
            therapeutic_class: "Respiratory",
            side_effects: "Sleepiness, Dry mouth",
        },
        SeedMedicine {
            id: 5,
            name: "Loratadine 10mg",
            uses: "Allergy",
            stock: 45,
            price_cents: 420,
            therapeutic_class: "Respiratory",
            side_effects: "Headache",
        },
        SeedMedicine {
            id: 6,
            name: "Amoxicillin 500mg",
            uses: "Bacterial infections",
            stock: 40,
            price_cents: 1200,
            therapeutic_class: "Anti infectives",
            side_effects: "Diarrhea, Rash",
        },
        SeedMedicine {
            id: 7,
            name: "Azithromycin 250mg",
            uses: "Bacterial infections",
            stock: 25,
            price_cents: 1850,
            therapeutic_class: "Anti infectives",
            side_effects: "Vomiting, Abdominal pain",
        },
        SeedMedicine {
            id: 8,
            name: "Omeprazole 20mg",
            uses: "Acidity",
            stock: 90,
            price_cents: 650,
            therapeutic_class: "Gastro intestinal",
            side_effects: "Flatulence",
        },
        SeedMedicine {
            id: 9,
            name: "Pantoprazole 40mg",
            uses: "Acidity",
            stock: 0,
            price_cents: 700,
            therapeutic_class: "Gastro intestinal",
            side_effects: "Headache, Diarrhea",
        },
        SeedMedicine {
            id: 10,
            name: "Metformin 500mg",
            uses: "Type 2 diabetes",
            stock: 150,
            price_cents: 400,
            therapeutic_class: "Antidiabetic",
            side_effects: "Taste change",
        },
        SeedMedicine {
            id: 11,
            name: "Amlodipine 5mg",
            uses: "Hypertension",
            stock: 70,
            price_cents: 550,
            therapeutic_class: "Cardiac",
            side_effects: "Swelling of ankles",
        },
        SeedMedicine {
            id: 12,
            name: "Salbutamol Inhaler",
            uses: "Asthma",
            stock: 20,
            price_cents: 2400,
            therapeutic_class: "Respiratory",
            side_effects: "Tremor",
        },
    ]
}

pub async fn seed_database(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let mut inserted = 0;

    for medicine in get_seed_data() {
        inserted += sqlx::query(
            "INSERT INTO medicines (id, name, uses, stock, price_cents, therapeutic_class, side_effects) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(medicine.id)
        .bind(medicine.name)
        .bind(medicine.uses)
        .bind(medicine.stock)
        .bind(medicine.price_cents)
        .bind(medicine.therapeutic_class)
        .bind(medicine.side_effects)
        .execute(pool)
        .await?
        .rows_affected();
    }

    Ok(inserted)
}

/// Random purchases by a handful of demo users, so every recommendation tier has data.
/// Purchases go through the regular transaction processor and may be rejected for stock.
async fn seed_demo_history(pharmacy: &Pharmacy) -> Result<(), ServiceError> {
    let ids: Vec<i64> = get_seed_data().iter().map(|m| m.id).collect();

    let plan: Vec<(&str, i64, i64)> = {
        let mut rng = rand::thread_rng();
        (0..DEMO_PURCHASES)
            .filter_map(|_| {
                let user = DEMO_USERS.choose(&mut rng)?;
                let medicine_id = ids.choose(&mut rng)?;
                Some((*user, *medicine_id, rng.gen_range(1..=3)))
            })
            .collect()
    };

    for (username, medicine_id, quantity) in plan {
        match pharmacy.purchase(username, medicine_id, quantity).await {
            Ok(receipt) => log::info!("{}", receipt.message),
            Err(e @ ServiceError::Storage(_)) => return Err(e),
            Err(e) => log::warn!("Skipped demo purchase: {}", e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok();

    let config = SeedConfig::init_from_env()?;
    let pool = init_db(&config.database_url, config.database_max_connections).await?;

    let inserted = seed_database(&pool).await?;
    log::info!("Seeded {} medicines", inserted);

    if config.seed_demo_history {
        seed_demo_history(&Pharmacy::new(pool)).await?;
    }

    Ok(())
}
