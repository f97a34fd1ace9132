use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Command-line client for the lens storefront API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products,
    /// Show the customization options of a product
    Options { product_id: String },
    /// Price a configuration
    Quote {
        product_id: String,
        /// Option value as option_id=value (repeatable)
        #[arg(short, long = "set", value_parser = parse_selection)]
        selections: Vec<(String, Value)>,
    },
    /// Validate a configuration and add it to the cart
    AddToCart {
        product_id: String,
        #[arg(short, long = "set", value_parser = parse_selection)]
        selections: Vec<(String, Value)>,
    },
}

/// `power=512` → ("power", 512), `color=blue` → ("color", "blue").
fn parse_selection(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected option_id=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("missing option id in '{}'", raw));
    }
    let value = match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::from(n),
        _ => Value::String(value.to_string()),
    };
    Ok((key.to_string(), value))
}

fn request_body(product_id: String, selections: Vec<(String, Value)>) -> Value {
    let selections: Map<String, Value> = selections.into_iter().collect();
    serde_json::json!({ "product_id": product_id, "selections": selections })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = format!("{}/api/v1", cli.url.trim_end_matches('/'));

    let res = match cli.command {
        Commands::Products => client.get(format!("{}/products", api)).send().await?,
        Commands::Options { product_id } => {
            client
                .get(format!("{}/products/{}/options", api, product_id))
                .send()
                .await?
        }
        Commands::Quote { product_id, selections } => {
            client
                .post(format!("{}/quote", api))
                .json(&request_body(product_id, selections))
                .send()
                .await?
        }
        Commands::AddToCart { product_id, selections } => {
            client
                .post(format!("{}/cart", api))
                .json(&request_body(product_id, selections))
                .send()
                .await?
        }
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: storefront API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("power=512").unwrap(), ("power".to_string(), Value::from(512.0)));
        assert_eq!(
            parse_selection("color=blue").unwrap(),
            ("color".to_string(), Value::String("blue".into()))
        );
        assert!(parse_selection("power").is_err());
        assert!(parse_selection("=3").is_err());
    }
}
