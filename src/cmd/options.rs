//! Accepted course and relationship values: `refer-earn options`.

use console::style;
use refer_common::{Course, Relationship};

pub fn cmd_options() {
    println!();
    println!("{}", style("Courses").bold());
    for course in Course::ALL {
        println!("  {:<24} {}", course.token(), style(course.label()).dim());
    }
    println!();
    println!("{}", style("Relationships").bold());
    for relationship in Relationship::ALL {
        println!("  {}", relationship);
    }
    println!();
}
