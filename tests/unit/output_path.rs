//! Output folder resolution

use hys_scraper::output::path::{default_folder_name, ATTACHMENTS_FILE, FEEDBACKS_FILE};
use hys_scraper::output::OutputLayout;
use hys_scraper::PublicationId;
use std::path::{Path, PathBuf};

#[test]
fn test_default_folder_is_relative_to_working_dir() {
    let id = PublicationId::parse("2665651").unwrap();
    let layout = OutputLayout::resolve(None, &id, Some("Digital Services Act"));

    assert_eq!(layout.root(), Path::new("2665651_digital_services_act"));
    assert_eq!(
        layout.feedbacks_csv(),
        PathBuf::from("2665651_digital_services_act").join(FEEDBACKS_FILE)
    );
}

#[test]
fn test_default_folder_without_title() {
    let id = PublicationId::parse("2665651").unwrap();
    let layout = OutputLayout::resolve(None, &id, None);

    assert_eq!(layout.root(), Path::new("2665651"));
    assert_eq!(layout.attachments_csv(), Path::new("2665651").join(ATTACHMENTS_FILE));
}

#[test]
fn test_camel_case_title() {
    let id = PublicationId::parse("7").unwrap();
    assert_eq!(default_folder_name(&id, Some("GreenDeal 2030")), "7_green_deal_2030");
}
