use html_escape::{encode_double_quoted_attribute, encode_text};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    Message,
};

use crate::comic::ComicIdentity;

pub fn subject(comic: &ComicIdentity) -> String {
    format!("{} - A new Made of Mistake comic", comic.title)
}

pub fn plain_body(comic: &ComicIdentity, link: &str) -> String {
    format!(
        "A new Made of Mistake comic was published: {}\n\nRead it at {link}\n",
        comic.title
    )
}

pub fn html_body(comic: &ComicIdentity, link: &str) -> String {
    format!(
        "<html>\n<body>\n<p>A new Made of Mistake comic was published:</p>\n<p><a href=\"{}\">{}</a></p>\n</body>\n</html>\n",
        encode_double_quoted_attribute(link),
        encode_text(&comic.title)
    )
}

/// Plain and HTML renderings as alternatives, HTML last so clients prefer it
///
/// `site_url` is linked when the comic has no link of its own
pub fn build_message(
    from: Mailbox,
    to: Mailbox,
    comic: &ComicIdentity,
    site_url: &str,
) -> Result<Message, lettre::error::Error> {
    let link = comic.link_or(site_url);
    Message::builder()
        .from(from)
        .to(to)
        .subject(subject(comic))
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(plain_body(comic, link)),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body(comic, link)),
                ),
        )
}
