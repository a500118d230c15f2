use std::fs;
use std::path::PathBuf;

use structopt::StructOpt;

use redletter::{EmailSender, ImageSource, MessageBuilder};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "redletter-mailer",
    about = "Compose a templated email and hand it to an SMTP server."
)]
struct Opt {
    #[structopt(short, long)]
    sender: String,

    #[structopt(short, long)]
    recipients: Vec<String>,

    #[structopt(long)]
    subject: String,

    /// HTML body template file
    #[structopt(long, parse(from_os_str))]
    html: Option<PathBuf>,

    /// Plain-text body template file
    #[structopt(long, parse(from_os_str))]
    text: Option<PathBuf>,

    /// Inline images as name=path pairs
    #[structopt(short, long)]
    image: Vec<String>,

    /// Config file path (default: /etc/redletter/redletter.toml)
    #[structopt(short, long)]
    config: Option<String>,
}

fn run(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = MessageBuilder::new()
        .sender(opt.sender)
        .recipients(opt.recipients)
        .subject(opt.subject);

    if let Some(path) = opt.html {
        builder = builder.html_body(fs::read_to_string(path)?);
    }

    if let Some(path) = opt.text {
        builder = builder.text_body(fs::read_to_string(path)?);
    }

    for pair in &opt.image {
        let mut split = pair.splitn(2, '=');

        match (split.next(), split.next()) {
            (Some(name), Some(path)) => {
                builder = builder.image(name, ImageSource::path(path));
            }
            _ => {
                return Err(format!("invalid image argument (want name=path): {}", pair).into());
            }
        }
    }

    let message = builder.build()?;

    log::info!(
        "Sending {} message to {}",
        message.content_type(),
        message.recipients().join(", ")
    );

    let config = redletter::config::load_config(opt.config.as_deref())?;
    let sender = EmailSender::from_config(&config);
    sender.send(&message)?;

    Ok(())
}

fn main() {
    // Init logger
    env_logger::builder().format_timestamp_micros().init();

    let opt = Opt::from_args();

    if let Err(e) = run(opt) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
