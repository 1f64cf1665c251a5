use url::Url;
use uuid::Uuid;

/// Public page where a customer follows their job
pub fn tracking_link(site_url: &str, job_id: Uuid) -> Result<Url, url::ParseError> {
    let mut url = base(site_url)?;
    let id = job_id.to_string();
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(["track", id.as_str()]);
    Ok(url)
}

/// Signup page pre-filled with a shop invitation
pub fn signup_link(site_url: &str, invitation_code: &str) -> Result<Url, url::ParseError> {
    let mut url = base(site_url)?;
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .push("signup");
    url.query_pairs_mut().append_pair("invite", invitation_code);
    Ok(url)
}

fn base(site_url: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(site_url.trim())?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
