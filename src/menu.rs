//! Interactive console menu driving an [`EnergyCoordinator`].
//!
//! Reads whitespace-separated tokens from any `BufRead` and writes prompts to
//! any `Write`, so the whole menu tree can be scripted in tests. End of input
//! behaves like choosing "0" at every level.
//!
//! Confirmations and warnings for coordinator operations are reported through
//! the coordinator's event sink; the menu itself only writes prompts and views.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::sim::{EnergyCoordinator, PassSummary};

/// Whitespace-delimited token reader over a line-oriented input.
struct Tokens<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// Returns the next token, or `None` at end of input.
    fn next_token(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
    }

    /// Drops whatever is left of the current input line.
    fn discard_line(&mut self) {
        self.pending.clear();
    }
}

/// A number read from the input, or why there isn't one.
enum Number<T> {
    Value(T),
    Invalid,
    Eof,
}

/// The console menu.
pub struct Menu<'a, R, W> {
    coordinator: &'a mut EnergyCoordinator,
    input: Tokens<R>,
    out: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(coordinator: &'a mut EnergyCoordinator, input: R, out: W) -> Self {
        Self {
            coordinator,
            input: Tokens::new(input),
            out,
        }
    }

    /// Runs the main menu until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error only if reading input or writing output fails.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.out, "\n<<< Welcome to Smart House Management >>>")?;
            writeln!(self.out, "1. View Status")?;
            writeln!(self.out, "2. Manage Smart Objects")?;
            writeln!(self.out, "3. Set Active Energy Source")?;
            writeln!(self.out, "4. Balance Load Across Sources")?;
            writeln!(self.out, "0. Exit")?;
            self.prompt("Choose an option: ")?;

            match self.read_number::<usize>()? {
                Number::Eof | Number::Value(0) => {
                    writeln!(self.out, "Exiting...")?;
                    return Ok(());
                }
                Number::Value(1) => self.view_status()?,
                Number::Value(2) => self.manage_devices()?,
                Number::Value(3) => self.set_active_source()?,
                Number::Value(4) => self.balance()?,
                Number::Value(_) => writeln!(self.out, "Invalid option. Please try again.")?,
                Number::Invalid => {}
            }
        }
    }

    fn prompt(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()
    }

    fn read_number<T: std::str::FromStr>(&mut self) -> io::Result<Number<T>> {
        let Some(token) = self.input.next_token()? else {
            return Ok(Number::Eof);
        };
        match token.parse::<T>() {
            Ok(value) => Ok(Number::Value(value)),
            Err(_) => {
                tracing::debug!(input = %token, "Invalid input. Please enter a valid number.");
                writeln!(self.out, "Invalid input. Please enter a valid number.")?;
                self.input.discard_line();
                Ok(Number::Invalid)
            }
        }
    }

    /// Reads tokens until "0" or end of input.
    fn wait_for_back(&mut self) -> io::Result<()> {
        loop {
            self.prompt("\nEnter (0) to go back: ")?;
            match self.input.next_token()? {
                None => return Ok(()),
                Some(token) if token == "0" => {
                    writeln!(self.out, "Returning to the previous menu...")?;
                    return Ok(());
                }
                Some(_) => writeln!(self.out, "Invalid input. Please enter 0 to go back.")?,
            }
        }
    }

    fn view_status(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n<<< Smart Objects >>>")?;
        for device in self.coordinator.devices() {
            writeln!(
                self.out,
                "{} - {} - Consumption: {} W",
                device.name(),
                if device.is_on() { "On" } else { "Off" },
                device.consumption()
            )?;
        }

        writeln!(self.out, "\n<<< Energy Sources >>>")?;
        for (i, source) in self.coordinator.sources().iter().enumerate() {
            let marker = if self.coordinator.active_index() == Some(i) { "*" } else { " " };
            writeln!(
                self.out,
                "{marker} {} - Rated: {} W - After last pass: {} W",
                source.kind().label(),
                source.rated_capacity(),
                source.remaining_capacity()
            )?;
        }
        let active = self
            .coordinator
            .active_source()
            .map_or("None", |s| s.kind().label());
        writeln!(self.out, "Active Source: {active}")?;
        writeln!(
            self.out,
            "Total Consumption: {} W",
            self.coordinator.total_consumption()
        )?;
        self.coordinator.check_capacity();

        self.wait_for_back()
    }

    fn manage_devices(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.out, "\n<<< Manage Smart Objects >>>")?;
            writeln!(self.out, "1. Add Smart Object")?;
            writeln!(self.out, "2. Remove Smart Object")?;
            writeln!(self.out, "3. Toggle Smart Object")?;
            writeln!(self.out, "4. List Smart Objects")?;
            writeln!(self.out, "0. Go Back")?;
            self.prompt("Choose an option: ")?;

            match self.read_number::<usize>()? {
                Number::Eof | Number::Value(0) => {
                    writeln!(self.out, "Returning to the previous menu...")?;
                    return Ok(());
                }
                Number::Value(1) => self.add_device()?,
                Number::Value(2) => self.remove_device()?,
                Number::Value(3) => self.toggle_devices()?,
                Number::Value(4) => self.list_devices()?,
                Number::Value(_) => writeln!(self.out, "Invalid option. Please try again.")?,
                Number::Invalid => {}
            }
        }
    }

    fn add_device(&mut self) -> io::Result<()> {
        self.prompt("\nEnter smart object name: ")?;
        let Some(name) = self.input.next_token()? else {
            return Ok(());
        };
        self.prompt("Enter Smart Object Power Rate (e.g., 200): ")?;
        let watts = match self.read_number::<f64>()? {
            Number::Value(w) if w >= 0.0 && w.is_finite() => w,
            Number::Value(_) => {
                writeln!(self.out, "Power rate must be a non-negative number.")?;
                return Ok(());
            }
            Number::Invalid | Number::Eof => return Ok(()),
        };
        self.coordinator.add_device(name, watts);
        Ok(())
    }

    fn remove_device(&mut self) -> io::Result<()> {
        self.prompt("Enter the name of the object to remove: ")?;
        let Some(name) = self.input.next_token()? else {
            return Ok(());
        };
        // not-found is already reported as a warning
        let _ = self.coordinator.remove_device(&name);
        Ok(())
    }

    fn toggle_devices(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.out, "\n<<< Toggle Smart Object >>>")?;
            for (i, device) in self.coordinator.devices().iter().enumerate() {
                writeln!(
                    self.out,
                    "{}. {} - {}",
                    i + 1,
                    device.name(),
                    if device.is_on() { "ON" } else { "OFF" }
                )?;
            }
            self.prompt("Select a smart object to toggle or enter 0 to go back: ")?;

            let choice = match self.read_number::<usize>()? {
                Number::Eof | Number::Value(0) => {
                    writeln!(self.out, "Returning to the previous menu...")?;
                    return Ok(());
                }
                Number::Value(n) => n - 1,
                Number::Invalid => continue,
            };

            match self.coordinator.toggle_device(choice) {
                Ok(toggled) => {
                    if let Some(pass) = &toggled.pass {
                        let summary = PassSummary::from_report(pass, self.coordinator.sources());
                        write!(self.out, "\n{summary}")?;
                    }
                }
                Err(_) => writeln!(self.out, "Invalid selection. Please try again.")?,
            }
        }
    }

    fn list_devices(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n<<< List of Smart Objects >>>")?;
        for (i, device) in self.coordinator.devices().iter().enumerate() {
            writeln!(self.out, "{}. {device}", i + 1)?;
        }
        self.wait_for_back()
    }

    fn set_active_source(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.out, "\n<<< Set Active Energy Source >>>")?;
            for (i, source) in self.coordinator.sources().iter().enumerate() {
                writeln!(
                    self.out,
                    "{}. {} - Remaining Capacity: {} W",
                    i + 1,
                    source.kind().label(),
                    source.rated_capacity()
                )?;
            }
            writeln!(self.out, "0. Go Back")?;
            self.prompt("Choose an energy source: ")?;

            let choice = match self.read_number::<usize>()? {
                Number::Eof | Number::Value(0) => {
                    writeln!(self.out, "Returning to the previous menu...")?;
                    return Ok(());
                }
                Number::Value(n) => n - 1,
                Number::Invalid => continue,
            };

            match self.coordinator.set_active_source(choice) {
                Ok(_) => {}
                Err(_) => writeln!(self.out, "Invalid selection. Please try again.")?,
            }
        }
    }

    fn balance(&mut self) -> io::Result<()> {
        match self.coordinator.balance() {
            Ok(report) => {
                let summary = PassSummary::from_report(&report, self.coordinator.sources());
                write!(self.out, "\n{summary}")
            }
            // the balancer has already warned
            Err(_) => Ok(()),
        }
    }
}
