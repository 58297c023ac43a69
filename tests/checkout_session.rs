use clickngo::{
    checkout_session::{CheckoutSession, CheckoutStage, SessionError},
    pricing::ShippingInfo,
};

fn shipping() -> ShippingInfo {
    ShippingInfo {
        address: "1 Main Street".into(),
        city: "Springfield".into(),
        zip: "12345".into(),
        country: "USA".into(),
    }
}

fn reviewed_session() -> CheckoutSession {
    let mut session = CheckoutSession::default();
    session.add_item(1, 2).expect("add");
    session.set_shipping(shipping()).expect("shipping");
    session.review().expect("review");
    session
}

#[test]
fn adding_the_same_product_merges_quantities() {
    let mut session = CheckoutSession::default();
    session.add_item(1, 1).expect("add");
    session.add_item(2, 1).expect("add");
    session.add_item(1, 3).expect("add");

    assert_eq!(session.lines().len(), 2);
    assert_eq!(session.lines()[0].quantity, 4);
    assert_eq!(session.stage(), CheckoutStage::CartOpen);
}

#[test]
fn invalid_quantities_are_rejected() {
    let mut session = CheckoutSession::default();
    assert_eq!(session.add_item(1, 0), Err(SessionError::InvalidQuantity(0)));
    session.add_item(1, 1).expect("add");
    assert_eq!(session.set_quantity(1, -2), Err(SessionError::InvalidQuantity(-2)));
    assert_eq!(session.set_quantity(5, 1), Err(SessionError::NotInCart(5)));
}

#[test]
fn setting_quantity_to_zero_removes_the_line() {
    let mut session = CheckoutSession::default();
    session.add_item(1, 2).expect("add");
    session.set_quantity(1, 0).expect("update");
    assert!(session.is_empty());
    assert_eq!(session.remove_item(1), Err(SessionError::NotInCart(1)));
}

#[test]
fn shipping_requires_items_and_every_field() {
    let mut session = CheckoutSession::default();
    assert_eq!(session.set_shipping(shipping()), Err(SessionError::EmptyCart));

    session.add_item(1, 1).expect("add");
    let mut missing_zip = shipping();
    missing_zip.zip = "  ".into();
    assert_eq!(
        session.set_shipping(missing_zip),
        Err(SessionError::MissingShippingField("zip"))
    );
    assert_eq!(session.stage(), CheckoutStage::CartOpen);

    session.set_shipping(shipping()).expect("shipping");
    assert_eq!(session.stage(), CheckoutStage::ShippingCollected);
}

#[test]
fn review_requires_shipping() {
    let mut session = CheckoutSession::default();
    session.add_item(1, 1).expect("add");
    assert_eq!(session.review(), Err(SessionError::MissingShipping));

    let mut empty = CheckoutSession::default();
    assert_eq!(empty.review(), Err(SessionError::EmptyCart));
}

#[test]
fn editing_after_review_requires_a_new_review() {
    let mut session = reviewed_session();
    assert_eq!(session.stage(), CheckoutStage::Reviewed);

    session.add_item(2, 1).expect("add");
    assert_eq!(session.stage(), CheckoutStage::ShippingCollected);
    assert!(session.ensure_confirmable().is_err());

    session.review().expect("review");
    session.apply_promotion(" welcome15 ").expect("promo");
    assert_eq!(session.promotion_code(), Some("WELCOME15"));
    assert_eq!(session.stage(), CheckoutStage::ShippingCollected);
}

#[test]
fn confirm_only_from_reviewed() {
    let mut session = CheckoutSession::default();
    session.add_item(1, 1).expect("add");
    let err = session.confirm().unwrap_err();
    assert_eq!(
        err,
        SessionError::InvalidTransition {
            from: CheckoutStage::CartOpen,
            action: "confirm",
        }
    );
}

#[test]
fn confirmed_session_is_frozen_until_cleared() {
    let mut session = reviewed_session();
    session.apply_promotion("SAVE50").expect("promo");
    session.review().expect("review");
    assert_eq!(session.ensure_confirmable().expect("confirmable"), &shipping());

    session.confirm().expect("confirm");
    assert_eq!(session.stage(), CheckoutStage::Confirmed);
    assert!(matches!(
        session.add_item(3, 1),
        Err(SessionError::InvalidTransition { .. })
    ));

    session.clear().expect("clear");
    assert_eq!(session, CheckoutSession::default());
    assert!(session.promotion_code().is_none());
    assert!(session.shipping().is_none());
}

#[test]
fn clear_is_only_allowed_after_confirm() {
    let mut session = reviewed_session();
    assert!(session.clear().is_err());
    assert_eq!(session.lines().len(), 1);
}

#[test]
fn session_survives_json_storage() {
    let mut session = reviewed_session();
    session.apply_promotion("save50").expect("promo");

    let stored = serde_json::to_value(&session).expect("serialize");
    assert_eq!(stored["stage"], "shipping_collected");
    let restored: CheckoutSession = serde_json::from_value(stored).expect("deserialize");
    assert_eq!(restored, session);
}
