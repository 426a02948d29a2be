use crate::value::{ControlError, SourcePos, Value};

/// Shape of one declared parameter, shared by lambdas and natives. The
/// default expression itself stays with the callee; the binder only needs to
/// know whether one exists.
#[derive(Debug, Clone)]
pub(crate) struct BindParam {
    pub(crate) name: String,
    pub(crate) has_default: bool,
    pub(crate) rest: bool,
}

/// Binding outcome per declared parameter, in declaration order. `Unbound`
/// means the callee must evaluate the parameter's default.
#[derive(Debug)]
pub(crate) enum Slot {
    Bound(Value),
    Unbound,
}

/// Resolve evaluated call arguments against a declared parameter list.
/// Spreads must already be expanded; `args` is the flat ordered list of
/// `(optional name, value)` pairs as they appeared at the call site.
pub(crate) fn bind(
    callee: &str,
    params: &[BindParam],
    args: Vec<(Option<String>, Value)>,
    pos: &SourcePos,
) -> Result<Vec<Slot>, ControlError> {
    let mut slots: Vec<Slot> = params.iter().map(|_| Slot::Unbound).collect();
    let mut rest_values: Vec<Value> = Vec::new();
    let rest_index = params.iter().position(|p| p.rest);

    let mut positionals: Vec<Value> = Vec::new();
    let mut seen_named = false;
    for (name, value) in args {
        match name {
            Some(name) => {
                seen_named = true;
                let idx = params.iter().position(|p| p.name == name).ok_or_else(|| {
                    ControlError::new(
                        format!("{}: no parameter named '{}'", callee, name),
                        pos.clone(),
                    )
                })?;
                slots[idx] = Slot::Bound(value);
            }
            None => {
                if seen_named {
                    return Err(ControlError::new(
                        format!("{}: positional argument after named argument", callee),
                        pos.clone(),
                    ));
                }
                positionals.push(value);
            }
        }
    }

    for value in positionals {
        let target = params.iter().enumerate().position(|(i, p)| {
            !p.rest && matches!(slots[i], Slot::Unbound)
        });
        match target {
            Some(idx) => slots[idx] = Slot::Bound(value),
            None => {
                if rest_index.is_some() {
                    rest_values.push(value);
                } else {
                    return Err(ControlError::new(
                        format!(
                            "{}: too many arguments ({} parameters declared)",
                            callee,
                            params.len()
                        ),
                        pos.clone(),
                    ));
                }
            }
        }
    }

    // A rest parameter always ends up holding a list, possibly empty, unless
    // a named argument already bound it outright.
    if let Some(idx) = rest_index {
        if matches!(slots[idx], Slot::Unbound) {
            slots[idx] = Slot::Bound(Value::list(rest_values));
        }
    }

    for (i, param) in params.iter().enumerate() {
        if matches!(slots[i], Slot::Unbound) && !param.has_default {
            return Err(ControlError::new(
                format!("{}: missing argument '{}'", callee, param.name),
                pos.clone(),
            ));
        }
    }

    Ok(slots)
}

/// Expand one spread value into the flat argument list: a Map contributes a
/// named argument per string key and an unnamed positional per non-string
/// key; a List or Set contributes one positional per element.
pub(crate) fn expand_spread(
    value: Value,
    out: &mut Vec<(Option<String>, Value)>,
    pos: &SourcePos,
) -> Result<(), ControlError> {
    match value {
        Value::Map(map) => {
            for (key, val) in map.borrow().iter() {
                match &key.0 {
                    Value::Str(name) => out.push((Some(name.as_ref().clone()), val.clone())),
                    _ => out.push((None, val.clone())),
                }
            }
            Ok(())
        }
        Value::List(items) => {
            for item in items.borrow().iter() {
                out.push((None, item.clone()));
            }
            Ok(())
        }
        Value::Set(items) => {
            for item in items.borrow().iter() {
                out.push((None, item.0.clone()));
            }
            Ok(())
        }
        other => Err(ControlError::new(
            format!("cannot spread a {}", other.type_name()),
            pos.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(spec: &[(&str, bool, bool)]) -> Vec<BindParam> {
        spec.iter()
            .map(|(name, has_default, rest)| BindParam {
                name: name.to_string(),
                has_default: *has_default,
                rest: *rest,
            })
            .collect()
    }

    fn pos() -> SourcePos {
        SourcePos::unknown()
    }

    fn bound(slot: &Slot) -> &Value {
        match slot {
            Slot::Bound(v) => v,
            Slot::Unbound => panic!("expected bound slot"),
        }
    }

    #[test]
    fn named_positional_and_mixed_forms_bind_identically() {
        let ps = params(&[("a", false, false), ("b", false, false)]);
        let variants = vec![
            vec![
                (Some("a".to_string()), Value::Int(1)),
                (Some("b".to_string()), Value::Int(2)),
            ],
            vec![(None, Value::Int(1)), (Some("b".to_string()), Value::Int(2))],
            vec![(None, Value::Int(1)), (None, Value::Int(2))],
        ];
        for args in variants {
            let slots = bind("f", &ps, args, &pos()).expect("bind");
            assert_eq!(bound(&slots[0]), &Value::Int(1));
            assert_eq!(bound(&slots[1]), &Value::Int(2));
        }
    }

    #[test]
    fn unknown_name_fails() {
        let ps = params(&[("a", false, false)]);
        let err = bind(
            "f",
            &ps,
            vec![(Some("z".to_string()), Value::Int(1))],
            &pos(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn positional_after_named_fails() {
        let ps = params(&[("a", false, false), ("b", false, false)]);
        let err = bind(
            "f",
            &ps,
            vec![(Some("a".to_string()), Value::Int(1)), (None, Value::Int(2))],
            &pos(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn overflow_without_rest_fails_and_with_rest_collects() {
        let ps = params(&[("a", false, false)]);
        assert!(bind(
            "f",
            &ps,
            vec![(None, Value::Int(1)), (None, Value::Int(2))],
            &pos()
        )
        .is_err());

        let ps = params(&[("a", false, false), ("xs", false, true)]);
        let slots = bind(
            "f",
            &ps,
            vec![(None, Value::Int(1)), (None, Value::Int(2)), (None, Value::Int(3))],
            &pos(),
        )
        .expect("bind");
        assert_eq!(
            bound(&slots[1]),
            &Value::list(vec![Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn rest_is_empty_list_when_nothing_overflows() {
        let ps = params(&[("xs", false, true)]);
        let slots = bind("f", &ps, vec![], &pos()).expect("bind");
        assert_eq!(bound(&slots[0]), &Value::list(vec![]));
    }

    #[test]
    fn missing_required_fails_but_defaulted_stays_unbound() {
        let ps = params(&[("a", false, false), ("b", true, false)]);
        assert!(bind("f", &ps, vec![], &pos()).is_err());
        let slots = bind("f", &ps, vec![(None, Value::Int(1))], &pos()).expect("bind");
        assert!(matches!(slots[1], Slot::Unbound));
    }

    #[test]
    fn map_spread_contributes_named_arguments() {
        let ps = params(&[("a", false, false), ("b", false, false)]);
        let map = Value::map_of(vec![
            (Value::from_string("a"), Value::Int(1)),
            (Value::from_string("b"), Value::Int(2)),
        ]);
        let mut args = Vec::new();
        expand_spread(map, &mut args, &pos()).expect("spread");
        let slots = bind("f", &ps, args, &pos()).expect("bind");
        assert_eq!(bound(&slots[0]), &Value::Int(1));
        assert_eq!(bound(&slots[1]), &Value::Int(2));
    }
}
