use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.model {
            Some(model) => println!("  model: {model}"),
            None => println!("  model: (unset, using {})", self.effective_model()),
        }
        match &self.base_url {
            Some(url) => println!("  base-url: {url}"),
            None => println!("  base-url: (unset, using {})", self.effective_base_url()),
        }
        match self.temperature {
            Some(temperature) => println!("  temperature: {temperature}"),
            None => println!(
                "  temperature: (unset, using {})",
                self.effective_temperature()
            ),
        }
        match self.markdown_enabled() {
            true => println!("  markdown: on"),
            false => println!("  markdown: off"),
        }
    }
}
