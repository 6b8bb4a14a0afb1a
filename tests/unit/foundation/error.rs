use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ShadeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ShadeError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        ShadeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn parse_error_names_channel_and_formula() {
    let err = ShadeError::Parse {
        channel: Channel::Green,
        formula: "x +".to_owned(),
        error: ExprError::new(3, "unexpected end of input"),
    };
    let msg = err.to_string();
    assert!(msg.contains("G channel"), "{msg}");
    assert!(msg.contains("`x +`"), "{msg}");
    assert!(err.is_formula_error());
}

#[test]
fn from_eval_keeps_kind() {
    let err = ShadeError::from_eval(Channel::Red, EvalError::UndefinedVariable("z".to_owned()));
    assert!(matches!(
        err,
        ShadeError::UndefinedVariable {
            channel: Channel::Red,
            ref name,
        } if name == "z"
    ));

    let err = ShadeError::from_eval(
        Channel::Alpha,
        EvalError::UnsupportedExpression("unknown function `foo`".to_owned()),
    );
    assert!(matches!(
        err,
        ShadeError::UnsupportedExpression {
            channel: Channel::Alpha,
            ..
        }
    ));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ShadeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert!(!err.is_formula_error());
}
