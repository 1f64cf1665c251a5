use uuid::Uuid;

fn short_code(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("{}-{}", prefix, &hex[..8])
}

/// Customer-facing job number, e.g. `JOB-1A2B3C4D`
pub fn job_number() -> String {
    short_code("JOB")
}

/// Code embedded in shop invitation links
pub fn invitation_code() -> String {
    short_code("INV")
}

pub fn ticket_number() -> String {
    short_code("TKT")
}
