//! This module provides the parser for persisted machine dumps, utilizing the `pest` crate
//! for record framing and `serde_json` for the state lines.

use pest::{iterators::Pair, Parser as PestParser};
use pest_derive::Parser as PestParser;
use std::fmt::Display;

use crate::machine::Machine;
use crate::state::State;
use crate::types::{Direction, StateId, TuringMachineError, Write, MAX_PROGRAM_SIZE};

/// Number of comma-separated fields in a transition record.
const RECORD_FIELDS: usize = 13;

/// Derives a `PestParser` for the dump grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DumpParser;

/// Parses a persisted dump into a `Machine`.
///
/// Loading is all-or-nothing: the first invalid record aborts the whole parse.
///
/// # Returns
///
/// * `Ok(Machine)` if every record is valid.
/// * `Err(TuringMachineError::ParseError)` if the text does not follow the record framing.
/// * `Err(TuringMachineError::MalformedRecord)` if a record is framed correctly but invalid.
pub fn parse(input: &str) -> Result<Machine, TuringMachineError> {
    if input.len() > MAX_PROGRAM_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Dump of {} bytes exceeds the {} byte limit",
            input.len(),
            MAX_PROGRAM_SIZE
        )));
    }

    let root = DumpParser::parse(Rule::dump, input)
        .map_err(|e| TuringMachineError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| malformed(1, "empty dump"))?;

    let mut machine = Machine::new();
    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::state_block => parse_states(pair, &mut machine)?,
            Rule::transition_block => parse_transitions(pair, &mut machine)?,
            _ => {} // EOI
        }
    }

    Ok(machine)
}

/// Parses every JSON state line of the state block into `machine`.
fn parse_states(pair: Pair<Rule>, machine: &mut Machine) -> Result<(), TuringMachineError> {
    for line in pair.into_inner() {
        let (number, _) = line.as_span().start_pos().line_col();
        let state: State =
            serde_json::from_str(line.as_str()).map_err(|e| malformed(number, e))?;

        if state.is_starting && machine.start_state().is_some() {
            return Err(malformed(number, "second start state"));
        }

        machine.insert_state(state).map_err(|e| malformed(number, e))?;
    }

    Ok(())
}

/// Parses every transition record into `machine`. States must already be declared.
fn parse_transitions(pair: Pair<Rule>, machine: &mut Machine) -> Result<(), TuringMachineError> {
    for record in pair.into_inner() {
        let (number, _) = record.as_span().start_pos().line_col();
        let fields: Vec<&str> = record.into_inner().map(|field| field.as_str()).collect();

        if fields.len() != RECORD_FIELDS {
            return Err(malformed(
                number,
                format!("expected {RECORD_FIELDS} fields, found {}", fields.len()),
            ));
        }

        let from = parse_state_columns(&fields[0..5], machine, number)?;
        let to = parse_state_columns(&fields[6..11], machine, number)?;
        let direction = fields[12]
            .trim()
            .parse::<Direction>()
            .map_err(|e| malformed(number, e))?;

        machine
            .create_transition(from, fields[5], to, Write::from_token(fields[11]), direction)
            .map_err(|e| malformed(number, e))?;
    }

    Ok(())
}

/// Resolves the `id, name, isStarting, isAccepting, isRejecting` columns against the
/// declared states. Every column must agree with the declaration.
fn parse_state_columns(
    columns: &[&str],
    machine: &Machine,
    number: usize,
) -> Result<StateId, TuringMachineError> {
    let id = columns[0]
        .trim()
        .parse::<StateId>()
        .map_err(|e| malformed(number, format!("state id {:?}: {e}", columns[0])))?;

    let state = machine
        .state(id)
        .ok_or_else(|| malformed(number, TuringMachineError::UnknownState(id)))?;

    if state.name != columns[1] {
        return Err(malformed(
            number,
            format!("state {id} is named {:?}, not {:?}", state.name, columns[1]),
        ));
    }

    let flags = [state.is_starting, state.is_accepting, state.is_rejecting];
    for (column, expected) in columns[2..5].iter().zip(flags) {
        let flag = parse_flag(column, number)?;
        if flag != expected {
            return Err(malformed(
                number,
                format!("role flags of state {id} disagree with its declaration"),
            ));
        }
    }

    Ok(id)
}

fn parse_flag(column: &str, number: usize) -> Result<bool, TuringMachineError> {
    match column.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(malformed(number, format!("expected true or false, found {other:?}"))),
    }
}

/// Creates a `TuringMachineError::MalformedRecord` for the given line.
fn malformed(line: usize, message: impl Display) -> TuringMachineError {
    TuringMachineError::MalformedRecord {
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::state::Roles;

    const DUMP: &str = concat!(
        r#"{"id":0,"name":"q0","isStarting":true,"isAccepting":false,"isRejecting":false}"#,
        "\n",
        r#"{"id":1,"name":"yes","isStarting":false,"isAccepting":true,"isRejecting":false}"#,
        "\n",
        r#"{"id":2,"name":"no","isStarting":false,"isAccepting":false,"isRejecting":true}"#,
        "\n",
        "\n",
        "0,q0,true,false,false,,1,yes,false,true,false,nothing,L\n",
        "0,q0,true,false,false,a,0,q0,true,false,false,b,R\n",
        "0,q0,true,false,false,else,2,no,false,false,true,nothing,N\n",
    );

    fn assert_malformed_at(input: &str, expected_line: usize) {
        match parse(input) {
            Err(TuringMachineError::MalformedRecord { line, .. }) => {
                assert_eq!(line, expected_line)
            }
            other => panic!("Expected a malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_dump() {
        let machine = parse(DUMP).unwrap();

        assert_eq!(machine.state_count(), 3);
        assert_eq!(machine.start_state(), Some(0));
        assert!(machine.accepting_states().contains(&1));
        assert!(machine.rejecting_states().contains(&2));
        assert_eq!(machine.transition_count(), 3);

        let blank = machine.lookup(0, "").unwrap();
        assert_eq!(blank.next, 1);
        assert_eq!(blank.write, Write::Nothing);
        assert_eq!(blank.direction, Direction::Left);

        assert_eq!(machine.lookup(0, "zzz").unwrap().next, 2);
        assert!(machine.alphabet().gamma().contains("b"));
        assert!(!machine.alphabet().gamma().contains("else"));
    }

    #[test]
    fn test_encoded_machine_parses_back() {
        let machine = parse(DUMP).unwrap();
        let reparsed = parse(&encode(&machine).unwrap()).unwrap();

        assert_eq!(
            reparsed.states().collect::<Vec<_>>(),
            machine.states().collect::<Vec<_>>()
        );
        assert_eq!(reparsed.transitions(), machine.transitions());
    }

    #[test]
    fn test_parse_empty_dump() {
        for input in ["", "\n", "\n\n"] {
            let machine = parse(input).unwrap();
            assert_eq!(machine.state_count(), 0);
            assert_eq!(machine.transition_count(), 0);
        }
    }

    #[test]
    fn test_parse_states_without_transition_block() {
        let input = r#"{"id":4,"name":"only","isStarting":true,"isAccepting":false,"isRejecting":false}"#;
        let machine = parse(input).unwrap();

        assert_eq!(machine.state(4).unwrap().name, "only");
        assert_eq!(machine.start_state(), Some(4));
    }

    #[test]
    fn test_parse_duplicate_names_in_flattened_dump() {
        let mut machine = Machine::new();
        machine.insert_state(State::new(0, "start", Roles::start()).unwrap()).unwrap();
        machine.insert_state(State::new(1, "start", Roles::none()).unwrap()).unwrap();

        let reparsed = parse(&encode(&machine).unwrap()).unwrap();
        assert_eq!(reparsed.state_count(), 2);
    }

    #[test]
    fn test_parse_bad_json() {
        assert_malformed_at("{\"id\":0,\"name\":\"q0\"}\n", 1);
    }

    #[test]
    fn test_parse_second_start_state() {
        let input = concat!(
            r#"{"id":0,"name":"a","isStarting":true,"isAccepting":false,"isRejecting":false}"#,
            "\n",
            r#"{"id":1,"name":"b","isStarting":true,"isAccepting":false,"isRejecting":false}"#,
            "\n",
        );
        assert_malformed_at(input, 2);
    }

    #[test]
    fn test_parse_duplicate_state_id() {
        let input = concat!(
            r#"{"id":0,"name":"a","isStarting":false,"isAccepting":false,"isRejecting":false}"#,
            "\n",
            r#"{"id":0,"name":"b","isStarting":false,"isAccepting":false,"isRejecting":false}"#,
            "\n",
        );
        assert_malformed_at(input, 2);
    }

    #[test]
    fn test_parse_invalid_move() {
        let input = DUMP.replace(",nothing,N\n", ",nothing,X\n");

        match parse(&input) {
            Err(TuringMachineError::MalformedRecord { line, message }) => {
                assert_eq!(line, 7);
                assert!(message.contains("Invalid move"));
            }
            other => panic!("Expected an invalid move, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_wrong_field_count() {
        let input = DUMP.replace(",b,R\n", ",R\n");
        assert_malformed_at(&input, 6);
    }

    #[test]
    fn test_parse_unknown_state() {
        let input = DUMP.replace(",else,2,no,", ",else,9,no,");
        assert_malformed_at(&input, 7);
    }

    #[test]
    fn test_parse_name_mismatch() {
        let input = DUMP.replace(",1,yes,", ",1,maybe,");
        assert_malformed_at(&input, 5);
    }

    #[test]
    fn test_parse_role_mismatch() {
        let input = DUMP.replace(",1,yes,false,true,", ",1,yes,false,false,");
        assert_malformed_at(&input, 5);
    }

    #[test]
    fn test_parse_reserved_write_symbol() {
        let input = DUMP.replace(",false,b,R\n", ",false,else,R\n");
        assert_malformed_at(&input, 6);
    }

    #[test]
    fn test_parse_garbage_is_a_framing_error() {
        assert!(matches!(
            parse("not a machine"),
            Err(TuringMachineError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_oversized_dump() {
        let input = "\n".repeat(MAX_PROGRAM_SIZE + 1);
        assert!(matches!(
            parse(&input),
            Err(TuringMachineError::ValidationError(_))
        ));
    }
}
