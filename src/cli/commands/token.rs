use anyhow::Context;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::{print_json, OutputFormat};

pub fn handle(user: Uuid, email: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = Claims::new(user, email);
    let exp = claims.exp;
    let token = generate_jwt(&claims).context("set SECURITY_JWT_SECRET to mint tokens")?;

    match output_format {
        OutputFormat::Json => print_json(&json!({ "token": token, "user_id": user, "exp": exp })),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
