// src/view.rs
//! HTML rendering for the job portal and the dashboard host page.
//! Pure functions of state; every dynamic string is escaped.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::aggregate::FetchState;
use crate::model::{JobListing, SearchQuery};

/// Seconds between browser polls while a cycle is unsettled.
pub const POLL_SECS: u32 = 2;

/// The portal block: heading plus loading, grid, empty or error affordance.
pub fn render_portal(state: &FetchState) -> String {
    let mut out = String::from("<div class=\"job-portal\">\n<h2>Recommended Jobs</h2>\n");
    match state {
        FetchState::Idle | FetchState::Loading => {
            out.push_str("<div class=\"jobs-loading\" aria-busy=\"true\">Loading jobs...</div>\n");
        }
        FetchState::Ready { listings } => {
            out.push_str("<div class=\"jobs-grid\">\n");
            for job in listings {
                render_card(&mut out, job);
            }
            out.push_str("</div>\n");
            if listings.is_empty() {
                out.push_str(
                    "<div class=\"jobs-empty\">No jobs found for your interests yet.</div>\n",
                );
            }
        }
        FetchState::Failed { reason } => {
            let _ = writeln!(
                out,
                "<div class=\"jobs-error\" role=\"alert\">Could not load jobs. <small>{}</small></div>",
                encode_text(reason)
            );
        }
    }
    out.push_str("</div>\n");
    out
}

fn render_card(out: &mut String, job: &JobListing) {
    let _ = write!(
        out,
        "<div class=\"job-card\" data-id=\"{id}\">\n\
         <h3>{title}</h3>\n\
         <p>{company}</p>\n\
         <p>{location}</p>\n\
         <p>{description}</p>\n\
         <a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">Apply Now</a>\n\
         </div>\n",
        id = encode_double_quoted_attribute(&job.id),
        title = encode_text(&job.title),
        company = encode_text(&job.company),
        location = encode_text(&job.location),
        description = encode_text(&job.description),
        url = encode_double_quoted_attribute(&job.apply_url),
    );
}

/// Full dashboard document composing the portal into the page layout.
/// While unsettled the page reloads itself through `poll_href`.
pub fn render_dashboard(query: &SearchQuery, state: &FetchState, poll_href: &str) -> String {
    let refresh = if state.is_settled() {
        String::new()
    } else {
        format!(
            "<meta http-equiv=\"refresh\" content=\"{POLL_SECS}; url={}\">\n",
            encode_double_quoted_attribute(poll_href)
        )
    };
    let interests = query
        .interests
        .iter()
        .map(|i| format!("<li>{}</li>", encode_text(i)))
        .collect::<String>();

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         {refresh}\
         <title>Dashboard</title>\n\
         <link rel=\"stylesheet\" href=\"/static/dashboard.css\">\n\
         </head>\n\
         <body>\n\
         <div class=\"dashboard\">\n\
         <header class=\"header\"><h1>Dashboard</h1></header>\n\
         <main class=\"main\">\n\
         <section class=\"job-section\">\n\
         <ul class=\"interests\">{interests}</ul>\n\
         {portal}\
         </section>\n\
         </main>\n\
         </div>\n\
         </body>\n\
         </html>\n",
        portal = render_portal(state),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str) -> JobListing {
        JobListing {
            id: "linkedin:1".into(),
            title: title.into(),
            company: "Acme".into(),
            location: "Remote".into(),
            description: "Ship it".into(),
            posted_at: None,
            apply_url: "https://jobs.test/1?a=1&b=2".into(),
        }
    }

    #[test]
    fn loading_has_indicator_and_no_cards() {
        let html = render_portal(&FetchState::Loading);
        assert!(html.contains("Loading jobs..."));
        assert!(!html.contains("job-card"));
        assert_eq!(render_portal(&FetchState::Idle), html);
    }

    #[test]
    fn ready_renders_cards_with_outbound_links() {
        let html = render_portal(&FetchState::Ready {
            listings: vec![job("Rust <Dev>")],
        });
        assert!(html.contains("<h3>Rust &lt;Dev&gt;</h3>"));
        assert!(html.contains("href=\"https://jobs.test/1?a=1&amp;b=2\""));
        assert!(html.contains("target=\"_blank\" rel=\"noopener noreferrer\""));
        assert!(!html.contains("jobs-empty"));
        assert!(!html.contains("Loading jobs..."));
    }

    #[test]
    fn empty_ready_is_distinct_from_loading_and_error() {
        let html = render_portal(&FetchState::Ready { listings: vec![] });
        assert!(html.contains("jobs-grid"));
        assert!(html.contains("jobs-empty"));
        assert!(!html.contains("Loading jobs..."));
        assert!(!html.contains("role=\"alert\""));
    }

    #[test]
    fn failed_shows_alert() {
        let html = render_portal(&FetchState::Failed {
            reason: "fetching <LinkedIn> listings".into(),
        });
        assert!(html.contains("role=\"alert\""));
        assert!(html.contains("&lt;LinkedIn&gt;"));
    }

    #[test]
    fn page_polls_only_while_unsettled() {
        let q = SearchQuery::new(["react"]);
        let loading = render_dashboard(&q, &FetchState::Loading, "/dashboard?a=1&poll=3");
        assert!(loading.contains("content=\"2; url=/dashboard?a=1&amp;poll=3\""));
        assert!(loading.contains("<h1>Dashboard</h1>"));
        assert!(loading.contains("<li>react</li>"));

        let ready = render_dashboard(&q, &FetchState::Ready { listings: vec![] }, "/dashboard");
        assert!(!ready.contains("http-equiv=\"refresh\""));
    }
}
