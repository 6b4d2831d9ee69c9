//! Validate an order against `examples/sval.yaml`
//!
//! Run with: cargo run -p sval --example basic

use std::net::IpAddr;

use chrono::{DateTime, FixedOffset};
use sval::{impl_shape, FileConfigLoader, Validator};

struct Customer {
    email: String,
    ip: IpAddr,
}

struct Line {
    sku: String,
    quantity: i64,
}

struct Order {
    id: String,
    customer: Customer,
    placed_at: DateTime<FixedOffset>,
    lines: Vec<Line>,
}

impl_shape!(Customer { email => "email", ip => "ip" });
impl_shape!(Line { sku => "sku", quantity => "quantity" });
impl_shape!(Order {
    id => "id",
    customer => "customer",
    placed_at => "placed_at",
    lines => "lines",
});

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = concat!(env!("CARGO_MANIFEST_DIR"), "/examples/sval.yaml");
    let validator = Validator::from_loader(&FileConfigLoader::new(config))?;
    println!("Loaded rules:\n{}", validator);

    let order = Order {
        id: "ORD-1001".to_string(),
        customer: Customer {
            email: "buyer@localhost".to_string(),
            ip: "10.1.2.3".parse()?,
        },
        // Saturday evening
        placed_at: DateTime::parse_from_rfc3339("2024-01-06T21:15:00+01:00")?,
        lines: vec![
            Line {
                sku: "ABC-0001".to_string(),
                quantity: 2,
            },
            Line {
                sku: "abc-2".to_string(),
                quantity: 0,
            },
        ],
    };

    match validator.validate(&order) {
        Ok(()) => println!("order is valid"),
        Err(errors) => {
            println!("{} violation(s):", errors.len());
            for error in &errors {
                println!("  {}", error);
            }
            println!("{}", errors.to_json_pretty());
        }
    }

    Ok(())
}
