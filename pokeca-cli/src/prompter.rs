use dialoguer::{theme::ColorfulTheme, FuzzySelect, MultiSelect};
use iter_tools::Itertools;
use pokeca_sim::prompters::Prompter;
use tracing::{info, warn};

/// Asks the person at the terminal
#[derive(Debug, Default)]
pub struct DialoguerPrompter {}

impl DialoguerPrompter {
    pub fn new() -> Self {
        DialoguerPrompter {}
    }
}

impl Prompter for DialoguerPrompter {
    fn prompt_choice<T: ToString>(&mut self, text: &str, mut choices: Vec<T>) -> T {
        self.print_choices(&choices);

        let items = choices.iter().map(T::to_string).collect_vec();
        let selected = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt(text)
            .items(&items)
            .default(0)
            .interact()
            .unwrap_or_else(|e| {
                warn!("could not read the choice, using the first one: {e}");
                0
            });
        let c = choices.swap_remove(selected);
        info!("{}", c.to_string());
        c
    }

    fn prompt_multi_choices<T: ToString>(
        &mut self,
        text: &str,
        choices: Vec<T>,
        min: usize,
        max: usize,
    ) -> Vec<T> {
        self.print_choices(&choices);

        let items = choices.iter().map(T::to_string).collect_vec();
        let selected = loop {
            let selected = MultiSelect::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("{text} ({min} to {max})"))
                .items(&items)
                .interact()
                .unwrap_or_else(|e| {
                    warn!("could not read the choices, using the first ones: {e}");
                    (0..min).collect_vec()
                });
            if (min..=max).contains(&selected.len()) {
                break selected;
            }
            println!("choose between {min} and {max}");
        };

        let c = choices
            .into_iter()
            .enumerate()
            .filter(|(i, _)| selected.contains(i))
            .map(|(_, c)| c)
            .collect_vec();
        info!("{}", c.iter().map(T::to_string).join(", "));
        c
    }
}
