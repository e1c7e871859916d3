//! Line-oriented form shell.
//!
//! # Responsibility
//! - Map text commands onto form edits and button actions.
//! - Render dialogs and the results view as plain text.
//!
//! # Invariants
//! - Field commands replay their argument as keystrokes through the
//!   field validator; rejected keystrokes are dropped.
//! - A failing command never ends the session.

use log::debug;
use sheetform_core::{
    Dialog, DialogKind, FormAction, FormController, Record, RecordField, TableClient,
};
use std::io::{self, BufRead, Write};

const HELP: &str = "\
commands:
  id <digits>      set the ID field
  name <letters>   set the Name field
  age <0-99>       set the Age field
  add              append the record (Add)
  clear            clear fields and results (Clear)
  read             list all records (Read)
  load             load Name/Age for the current ID (Load)
  delete           delete the record with the current ID (Delete)
  show             print fields and results
  tables           list table titles
  help             print this help
  quit             leave the shell";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Field(RecordField, String),
    Action(FormAction),
    Show,
    Tables,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let word = word.to_ascii_lowercase();

        if let Some(field) = RecordField::parse(&word) {
            return Ok(Some(Self::Field(field, rest.to_string())));
        }
        if !rest.is_empty() {
            return Err(format!("`{word}` takes no arguments"));
        }

        let command = match word.as_str() {
            "add" => Self::Action(FormAction::Add),
            "clear" => Self::Action(FormAction::Clear),
            "read" => Self::Action(FormAction::Read),
            "load" => Self::Action(FormAction::Load),
            "delete" => Self::Action(FormAction::Delete),
            "show" => Self::Show,
            "tables" => Self::Tables,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command `{other}`; try `help`")),
        };
        Ok(Some(command))
    }
}

/// Interactive shell bound to one form.
pub struct Shell<C: TableClient, W: Write> {
    form: FormController<C>,
    out: W,
}

impl<C: TableClient, W: Write> Shell<C, W> {
    pub fn new(form: FormController<C>, out: W) -> Self {
        Self { form, out }
    }

    #[cfg(test)]
    pub fn form(&self) -> &FormController<C> {
        &self.form
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Reads commands until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead) -> io::Result<()> {
        writeln!(
            self.out,
            "SheetForm ({}). Type `help` for commands.",
            self.form.service().table_title()
        )?;
        self.prompt()?;
        for line in input.lines() {
            let line = line?;
            match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.execute(command)?,
                Ok(None) => {}
                Err(message) => writeln!(self.out, "{message}")?,
            }
            self.prompt()?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        debug!("event=shell_command module=cli command={command:?}");
        match command {
            Command::Field(field, text) => {
                self.form.edit(field, "");
                let dropped = self.form.type_text(field, &text);
                if dropped > 0 {
                    writeln!(
                        self.out,
                        "{field}: dropped {dropped} invalid keystroke(s), now `{}`",
                        self.form.state().field(field)
                    )?;
                }
            }
            Command::Action(action) => {
                let dialog = self.form.dispatch(action);
                if let Some(dialog) = dialog {
                    self.render_dialog(&dialog)?;
                }
                if action == FormAction::Read {
                    self.render_results()?;
                }
            }
            Command::Show => {
                for field in RecordField::ALL {
                    let text = self.form.state().field(field);
                    writeln!(self.out, "{:<5} {text}", field.label())?;
                }
                self.render_results()?;
            }
            Command::Tables => match self.form.tables() {
                Ok(titles) => {
                    for title in titles {
                        writeln!(self.out, "  {title}")?;
                    }
                }
                Err(dialog) => self.render_dialog(&dialog)?,
            },
            Command::Help => writeln!(self.out, "{HELP}")?,
            Command::Quit => {}
        }
        Ok(())
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }

    fn render_dialog(&mut self, dialog: &Dialog) -> io::Result<()> {
        let tag = match dialog.kind {
            DialogKind::Info => "info",
            DialogKind::Warning => "warning",
            DialogKind::Error => "error",
        };
        writeln!(self.out, "[{tag}] {}: {}", dialog.title, dialog.message)
    }

    fn render_results(&mut self) -> io::Result<()> {
        let table = render_table(&self.form.state().results);
        write!(self.out, "{table}")
    }
}

/// Renders records as an aligned `ID | Name | Age` table.
pub fn render_table(records: &[Record]) -> String {
    let headers = RecordField::ALL.map(RecordField::label);
    let mut widths = headers.map(str::len);
    for record in records {
        for (width, cell) in widths.iter_mut().zip(cells(record)) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 3]| {
        let padded = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut out = line(headers);
    out.push_str(&format!(
        "{}\n",
        widths.map(|width| "-".repeat(width)).join("-+-")
    ));
    for record in records {
        out.push_str(&line(cells(record)));
    }
    out
}

fn cells(record: &Record) -> [&str; 3] {
    [&record.id, &record.name, &record.age]
}

#[cfg(test)]
mod tests {
    use super::{render_table, Command, Shell};
    use sheetform_core::{
        FormAction, FormController, MemoryTableClient, Record, RecordField, RecordService,
        DEFAULT_TABLE_TITLE,
    };

    fn shell() -> Shell<MemoryTableClient, Vec<u8>> {
        let client =
            MemoryTableClient::with_table(DEFAULT_TABLE_TITLE, &[Record::new("1", "Ann", "30")]);
        Shell::new(FormController::new(RecordService::new(client)), Vec::new())
    }

    fn output(shell: Shell<MemoryTableClient, Vec<u8>>) -> String {
        String::from_utf8(shell.into_output()).unwrap()
    }

    #[test]
    fn parse_field_and_action_commands() {
        assert_eq!(
            Command::parse("Name  Ann Lee").unwrap(),
            Some(Command::Field(RecordField::Name, "Ann Lee".to_string()))
        );
        assert_eq!(
            Command::parse("id").unwrap(),
            Some(Command::Field(RecordField::Id, String::new()))
        );
        assert_eq!(
            Command::parse(" DELETE ").unwrap(),
            Some(Command::Action(FormAction::Delete))
        );
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert!(Command::parse("read now").is_err());
        assert!(Command::parse("update").is_err());
    }

    #[test]
    fn field_command_replaces_text_and_reports_dropped_keystrokes() {
        let mut shell = shell();
        shell.execute(Command::Field(RecordField::Age, "1x2".to_string())).unwrap();
        shell.execute(Command::Field(RecordField::Age, "4".to_string())).unwrap();
        assert_eq!(shell.form().state().age, "4");
        let text = output(shell);
        assert!(text.contains("dropped 1 invalid keystroke(s), now `12`"));
    }

    #[test]
    fn run_executes_script_until_quit() {
        let mut shell = shell();
        let script = "id 2\nname Bob\nage 41\nadd\nread\nquit\nid 9\n";
        shell.run(script.as_bytes()).unwrap();
        assert_eq!(shell.form().state().id, "2");
        assert_eq!(shell.form().state().results.len(), 2);

        let text = output(shell);
        assert!(text.contains("[info] Success: Data appended successfully."));
        assert!(text.contains("2  | Bob  | 41"));
    }

    #[test]
    fn unknown_command_does_not_end_session() {
        let mut shell = shell();
        shell.run("bogus\nid 1\nload\n".as_bytes()).unwrap();
        assert_eq!(shell.form().state().name, "Ann");
        assert!(output(shell).contains("unknown command `bogus`"));
    }

    #[test]
    fn render_table_pads_columns() {
        let rendered = render_table(&[Record::new("10", "Alexander", "7")]);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "ID | Name      | Age");
        assert_eq!(lines[1], "---+-----------+----");
        assert_eq!(lines[2], "10 | Alexander | 7");
    }
}
