use cfpilot::command::PilotCommand;
use cfpilot::flight::DEFAULT_TAKE_OFF_THRUST;
use cfpilot::{Direction, Error};

fn parse(line: &str) -> Result<PilotCommand, Error> {
    line.parse()
}

#[test]
fn fly_defaults_to_upwards_at_take_off_thrust() {
    assert_eq!(
        parse("fly").unwrap(),
        PilotCommand::Fly {
            direction: Direction::Upwards,
            thrust: DEFAULT_TAKE_OFF_THRUST
        }
    );
    assert_eq!(
        parse("  TAKEOFF backward ").unwrap(),
        PilotCommand::Fly {
            direction: Direction::Backward,
            thrust: DEFAULT_TAKE_OFF_THRUST
        }
    );
}

#[test]
fn simple_verbs_and_aliases() {
    assert_eq!(parse("show").unwrap(), PilotCommand::Show);
    assert_eq!(parse("list").unwrap(), PilotCommand::Show);
    assert_eq!(parse("sequence").unwrap(), PilotCommand::Sequence);
    assert_eq!(parse("climb").unwrap(), PilotCommand::Climb);
    assert_eq!(parse("disconnect").unwrap(), PilotCommand::Disconnect);
    assert_eq!(parse("exit").unwrap(), PilotCommand::Quit);
    assert_eq!(parse("?").unwrap(), PilotCommand::Help);
}

#[test]
fn malformed_lines_are_refused() {
    for line in ["", "   ", "jump", "fly sideways", "fly up 70000", "fly up -1", "show all"] {
        assert!(matches!(parse(line), Err(Error::Config(_))), "{:?} was accepted", line);
    }
}
