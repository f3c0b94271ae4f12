//! Modelium
//!
//! Schema-graph core for model-driven code generation.
//!
//! This binary is a small demonstration: it builds a sample shop schema
//! through the builder API, runs the projection pass, validates the
//! result, and prints the data graphs a generator would request.

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use modelium_core::{DefaultValue, PropType, ScalarType};
use modelium_schema::{GraphOptions, SchemaRegistry, build_data_graph, render, validate_schema};

fn main() -> Result<()> {
    // Initialize logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .pretty()
        .init();

    println!();
    println!("Modelium — schema-graph core for model-driven code generation");
    println!();

    let mut registry = build_sample_schema()?;

    registry.build_all()?;
    info!(types = registry.type_count(), "schema built");

    let report = validate_schema(&registry);
    if !report.is_valid() {
        eprintln!("{}", report);
        anyhow::bail!("sample schema failed validation");
    }
    println!("validation: ok ({} warnings)", report.warnings().count());
    println!();

    print_projection(&registry)?;
    print_data_graphs(&registry)?;
    Ok(())
}

/// Customer / Order / OrderLine / Product, all models paired with stores
fn build_sample_schema() -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new("shop");

    let customer = {
        let mut b = registry.define_model("Customer");
        b.with_store("CustomerRow")?;
        b.key("Id", ScalarType::Uuid)?;
        b.prop("Name", PropType::string())?.required()?.done();
        b.prop("Email", PropType::string())?.done();
        b.id()
    };

    let product = {
        let mut b = registry.define_model("Product");
        b.with_store("ProductRow")?;
        b.key("Id", ScalarType::Uuid)?;
        b.prop("Name", PropType::string())?.required()?.done();
        b.prop("Price", PropType::scalar(ScalarType::Decimal))?
            .min(0.0)?
            .done();
        b.id()
    };

    let order = {
        let mut b = registry.define_model("Order");
        b.with_store("OrderRow")?;
        b.key("Id", ScalarType::Uuid)?;
        b.prop("Number", PropType::string())?.required()?.done();
        b.prop("Placed", PropType::scalar(ScalarType::DateTime))?
            .default_value(DefaultValue::Now)?
            .done();
        b.to_one("Customer", customer)?.done();
        b.id()
    };

    let line = {
        let mut b = registry.define_model("OrderLine");
        b.with_store("OrderLineRow")?;
        b.key("Id", ScalarType::Uuid)?;
        b.prop("Qty", PropType::scalar(ScalarType::Int32))?
            .min(1.0)?
            .done();
        b.to_one("Order", order)?.done();
        b.to_one("Product", product)?.done();
        b.id()
    };

    {
        let mut b = registry.edit_type(order)?;
        b.to_many("Lines", line)?.done();
    }

    Ok(registry)
}

fn print_projection(registry: &SchemaRegistry) -> Result<()> {
    println!("projected stores:");
    for type_def in registry.types() {
        let Some(store_id) = type_def.store else {
            continue;
        };
        let store = registry.require_type(store_id)?;
        let props: Vec<&str> = store
            .local_props
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        println!("  {} -> {} [{}]", type_def.name, store.name, props.join(", "));
    }
    println!();
    Ok(())
}

fn print_data_graphs(registry: &SchemaRegistry) -> Result<()> {
    let order = registry
        .find_type_by_name("Order")
        .ok_or_else(|| anyhow::anyhow!("Order type missing"))?;

    let props: Vec<_> = registry
        .effective_props(order.id)?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let plain = build_data_graph(registry, &props, GraphOptions::default())?;
    println!("order graph:            {}", render(&plain));

    let keyed = build_data_graph(registry, &props, GraphOptions::with_keys())?;
    println!("order graph (+keys/fk): {}", render(&keyed));
    println!();
    Ok(())
}
