use std::time::Duration;

use engine_logging::engine_debug;

use crate::address::{host_key, normalize_url};
use crate::fetch::PageFetcher;
use crate::{FetchOutcome, Verdict};

/// Compare one row's email-domain URL against its company-domain URL.
///
/// Both pages are always fetched, even when the hosts already match, so a
/// failing fetch still shows up in the note. Fetch failures dominate; host
/// identity and byte-identical HTML are equally sufficient for a pass.
pub async fn compare_pair(
    fetcher: &dyn PageFetcher,
    email_url: &str,
    company_url: &str,
    timeout: Duration,
) -> Verdict {
    let (Some(u1), Some(u2)) = (normalize_url(Some(email_url)), normalize_url(Some(company_url)))
    else {
        return Verdict::MissingUrl;
    };

    let same_host = host_key(&u1) == host_key(&u2);
    let (r1, r2) = tokio::join!(fetcher.fetch(&u1, timeout), fetcher.fetch(&u2, timeout));

    let verdict = reduce(same_host, &r1, &r2);
    engine_debug!("compared {} vs {}: {}", u1, u2, verdict);
    verdict
}

fn reduce(same_host: bool, r1: &FetchOutcome, r2: &FetchOutcome) -> Verdict {
    let (p1, p2) = match (r1, r2) {
        (Ok(p1), Ok(p2)) => (p1, p2),
        _ => {
            return Verdict::FetchErr {
                email: side_label(r1),
                company: side_label(r2),
            }
        }
    };

    if same_host || p1.html == p2.html {
        Verdict::Pass
    } else if p1.html.is_empty() || p2.html.is_empty() {
        Verdict::EmptyBody
    } else {
        Verdict::StillDiff
    }
}

fn side_label(outcome: &FetchOutcome) -> String {
    match outcome {
        Ok(page) => page
            .status
            .map_or_else(|| "OK".to_string(), |status| status.to_string()),
        Err(err) => err
            .status
            .map_or_else(|| err.kind.label().to_string(), |status| status.to_string()),
    }
}
