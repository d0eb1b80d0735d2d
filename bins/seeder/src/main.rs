//! Database seeder for Safra development and testing.
//!
//! Seeds a few employees, the company bank account and an advance so the
//! payroll screens have something to work with. Running it twice is harmless.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use safra_core::payroll::ContractType;
use safra_core::pix::PixKeyType;
use safra_db::repositories::{
    AdvanceRepository, CreateAdvanceInput, CreateBankAccountInput, CreateEmployeeInput,
    EmployeeFilter, EmployeeRepository, PaymentRepository,
};
use safra_shared::types::PageRequest;

/// User recorded as the author of seeded rows.
const SEED_USER_ID: Uuid = Uuid::from_u128(1);

struct SeedEmployee {
    name: &'static str,
    cpf: Option<&'static str>,
    contract_type: ContractType,
    base_salary: Decimal,
    daily_rate: Decimal,
    pix_key: Option<(PixKeyType, &'static str)>,
}

const EMPLOYEES: [SeedEmployee; 3] = [
    SeedEmployee {
        name: "Antônio Pereira",
        cpf: Some("529.982.247-25"),
        contract_type: ContractType::Mensalista,
        base_salary: dec!(2400),
        daily_rate: Decimal::ZERO,
        pix_key: Some((PixKeyType::Cpf, "529.982.247-25")),
    },
    SeedEmployee {
        name: "Maria das Dores",
        cpf: None,
        contract_type: ContractType::Diarista,
        base_salary: Decimal::ZERO,
        daily_rate: dec!(110),
        pix_key: Some((PixKeyType::Email, "maria.dores@example.com")),
    },
    SeedEmployee {
        name: "José Ribeiro",
        cpf: Some("111.444.777-35"),
        contract_type: ContractType::Diarista,
        base_salary: Decimal::ZERO,
        daily_rate: dec!(120),
        pix_key: None,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = safra_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding employees...");
    seed_employees(&db).await?;

    println!("Seeding bank account...");
    seed_bank_account(&db).await?;

    println!("Seeding advances...");
    seed_advance(&db).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn find_employee(db: &DatabaseConnection, name: &str) -> anyhow::Result<Option<Uuid>> {
    let (rows, _) = EmployeeRepository::new(db.clone())
        .list(
            EmployeeFilter {
                is_active: None,
                search: Some(name.to_string()),
            },
            &PageRequest::default(),
        )
        .await?;
    Ok(rows.into_iter().find(|e| e.name == name).map(|e| e.id))
}

async fn seed_employees(db: &DatabaseConnection) -> anyhow::Result<()> {
    let repo = EmployeeRepository::new(db.clone());

    for seed in &EMPLOYEES {
        if find_employee(db, seed.name).await?.is_some() {
            println!("  {} already exists, skipping...", seed.name);
            continue;
        }

        let input = CreateEmployeeInput {
            name: seed.name.to_string(),
            cpf: seed.cpf.map(str::to_string),
            contract_type: seed.contract_type,
            base_salary: seed.base_salary,
            daily_rate: seed.daily_rate,
            pix_key: seed
                .pix_key
                .map(|(key_type, raw)| (key_type, raw.to_string())),
        };
        match repo.create(input).await {
            Ok(employee) => println!("  Created {} ({})", employee.name, employee.contract_type),
            Err(e) => eprintln!("Failed to insert {}: {e}", seed.name),
        }
    }
    Ok(())
}

async fn seed_bank_account(db: &DatabaseConnection) -> anyhow::Result<()> {
    let repo = PaymentRepository::new(db.clone());
    if !repo.list_bank_accounts().await?.is_empty() {
        println!("  Bank account already exists, skipping...");
        return Ok(());
    }

    let account = repo
        .create_bank_account(CreateBankAccountInput {
            name: "Banco do Brasil - Folha".to_string(),
            agency: "3456".to_string(),
            account_number: "12345-6".to_string(),
            agreement_number: "123456".to_string(),
        })
        .await?;
    println!("  Created bank account: {}", account.name);
    Ok(())
}

async fn seed_advance(db: &DatabaseConnection) -> anyhow::Result<()> {
    let Some(employee_id) = find_employee(db, EMPLOYEES[0].name).await? else {
        println!("  {} not found, skipping...", EMPLOYEES[0].name);
        return Ok(());
    };

    let repo = AdvanceRepository::new(db.clone());
    if !repo.list(Some(employee_id), false).await?.is_empty() {
        println!("  Advance already exists, skipping...");
        return Ok(());
    }

    let advance = repo
        .create(CreateAdvanceInput {
            employee_id,
            total_amount: dec!(600),
            installment_count: 3,
            granted_on: Utc::now().date_naive(),
            description: Some("Adiantamento de safra".to_string()),
            created_by: SEED_USER_ID,
        })
        .await?;
    println!(
        "  Created advance of {} in {} installments",
        advance.advance.total_amount,
        advance.installments.len()
    );
    Ok(())
}
