use super::*;

fn fetched() -> GuestRecord {
    GuestRecord {
        invitees: 4,
        modification: "bringing a cousin".into(),
        food_requirements: String::new(),
        needs_accomodation: true,
        needs_passage: false,
        confirmed: true,
    }
}

#[test]
fn render_toggles_exactly_one_form() {
    let mut page = Page::default();

    page.render(SessionState::Unauthenticated);
    assert!(page.login.visible);
    assert!(!page.rsvp.visible);

    page.render(SessionState::Authenticated);
    assert!(!page.login.visible);
    assert!(page.rsvp.visible);
}

#[test]
fn filled_form_maps_booleans_to_checkboxes() {
    let mut form = RsvpForm::default();
    form.fill_from(&fetched());

    assert!(form.needs_accommodation);
    assert!(!form.needs_passage);
    assert!(form.confirmed);
    assert_eq!(form.to_record(), fetched());
}

#[test]
fn invitees_lock_once_filled() {
    let mut form = RsvpForm::default();
    assert!(form.invitees_editable());

    form.fill_from(&GuestRecord::default());
    assert!(!form.invitees_editable());
    let err = form.set_invitees(9).expect_err("read-only");
    assert!(matches!(err, SessionError::ReadOnlyField("invitees")));
    assert_eq!(form.invitees(), Some(0));
}

#[test]
fn signing_out_discards_form_contents_and_closes_modal() {
    let mut page = Page::default();
    page.render(SessionState::Authenticated);
    page.rsvp.fill_from(&fetched());
    page.confirmation.open = true;

    page.render(SessionState::Unauthenticated);

    assert_eq!(page.rsvp.invitees(), None);
    assert!(page.rsvp.modification.is_empty());
    assert!(!page.confirmation.open);
}
